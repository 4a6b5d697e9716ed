//! `llamahub` server entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use llamahub_axum::{Cli, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    start_server(cli.into_server_config()).await
}
