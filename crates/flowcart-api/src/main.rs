//! FlowCart API service binary.

use anyhow::{Context, Result};
use clap::Parser;
use flowcart_api::{router, ApiConfig, AppState};
use tracing_subscriber::EnvFilter;

/// FlowCart checkout and warehouse API
#[derive(Parser)]
#[command(name = "flowcart-api")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address override, e.g. 0.0.0.0:4002
    #[arg(short, long)]
    listen: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => ApiConfig::load(path)?,
        None => ApiConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }

    let (state, _catalog) = AppState::in_memory(&config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
    tracing::info!(addr = %config.server.listen_addr, "flowcart-api listening");

    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}
