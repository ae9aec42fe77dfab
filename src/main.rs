mod config;
mod relay;
mod store;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LogConfig};
use crate::store::MessageStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    init_logging(&config.log)?;

    info!("Configuration loaded from: {}", config_path.display());
    info!("  User endpoint: {}", config.server.user_addr());
    info!("  Admin endpoint: {}", config.server.admin_addr());
    if let Some(file) = &config.log.file {
        info!("  Log file: {}", file.display());
    }

    // Shared between both listeners
    let store = Arc::new(MessageStore::new());

    info!("Relay is starting...");
    relay::run(&config.server, store).await?;

    Ok(())
}

fn init_logging(config: &LogConfig) -> Result<()> {
    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.filter_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}
