pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::relay::ChatRelay;
pub use cli::Cli;
pub use config::{AppConfig, ConfigError};
pub use domain::types;
pub use infrastructure::{model, server};
