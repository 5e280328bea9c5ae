//! Logging setup shared by the binaries
//!
//! Logs always go to stderr so stdout carries nothing but the JSON result or
//! provisioning progress. `RUST_LOG` wins over `--verbose` when set.

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Install the global subscriber
pub fn init(verbose: bool, format: LogFormat) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
