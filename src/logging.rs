//! Logging setup and log targets
//!
//! Log targets double as the crate's logging categories; filter them with
//! RUST_LOG, e.g. `RUST_LOG=layerstack::loader=debug`.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Layer stacks, pushes, pops and supersedes
pub const LAYOUT_TARGET: &str = "layerstack::layout";
/// Async class loads
pub const LOADER_TARGET: &str = "layerstack::loader";
/// Input suspension
pub const INPUT_TARGET: &str = "layerstack::input";

/// Filter from RUST_LOG, or the configured level when RUST_LOG is unset or invalid
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Call once at session start.
pub fn init(config: &LoggingConfig, log_file: Option<&Path>) -> Result<()> {
    let filter = env_filter(&config.level);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .context(format!("Failed to create log directory: {:?}", parent))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .context(format!("Failed to open log file: {:?}", path))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false) // No color codes in log file
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;
        }
    }

    tracing::debug!(target: LAYOUT_TARGET, "logging initialized");
    Ok(())
}
