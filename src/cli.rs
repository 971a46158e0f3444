use std::net::SocketAddr;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "studyhub-relay",
    version,
    about = "Chat relay service for the StudyHub past-papers portal"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Bind address (overrides config if specified)
    #[arg(long)]
    pub addr: Option<SocketAddr>,
}
