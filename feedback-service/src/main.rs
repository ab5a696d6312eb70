use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use feedback_service::prelude::*;

/// Feedback collector HTTP service
#[derive(Parser)]
#[command(name = "feedback-service")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard search path
    #[arg(short, long, value_name = "PATH", env = "FEEDBACK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };

    init_tracing(&config);

    let stores = Stores::open(&config.store)
        .await
        .context("Failed to open feedback store")?;
    let state = AppState::new(config.clone(), stores).context("Failed to build application state")?;

    let result = Server::new(config).serve(app(state)).await;

    shutdown_tracing();
    result.context("Server error")
}
