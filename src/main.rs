use clap::Parser;
use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use studyhub_relay::application::relay::ChatRelay;
use studyhub_relay::cli::Cli;
use studyhub_relay::config::AppConfig;
use studyhub_relay::infrastructure::model::{CompletionClient, resolve_api_key};
use studyhub_relay::infrastructure::server::{self, AppState};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    init_tracing();
    info!("Starting StudyHub chat relay");

    let config_path = args.config.as_deref().map(Path::new);
    let config = AppConfig::load(config_path)?;
    debug!(
        endpoint = config.upstream.endpoint.as_str(),
        candidates = config.upstream.models.len(),
        "Configuration loaded"
    );

    let addr: SocketAddr = match args.addr {
        Some(addr) => addr,
        None => config.bind.parse()?,
    };

    let relay = match resolve_api_key() {
        Some(api_key) => {
            let client = CompletionClient::new(&config.upstream, api_key)?;
            Some(ChatRelay::new(client, &config.assistant))
        }
        None => {
            warn!("no upstream API key found; chat endpoints will answer with a configuration error");
            None
        }
    };

    let state = Arc::new(AppState::new(relay));
    server::serve(state, addr).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();
}
