//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// `RUST_LOG` is ignored; the filter comes from `service.log_level`. Calling
/// this twice is harmless, the second install is skipped.
pub fn init_tracing(config: &Config) {
    let filter = env_filter(&config.service.log_level);

    let installed = match config.service.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            environment = %config.service.environment,
            "Tracing initialized for service: {}",
            config.service.name
        );
    }
}

pub fn shutdown_tracing() {
    tracing::info!("Tracing shutdown");
}
