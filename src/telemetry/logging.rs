//! Structured logging setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Human-readable format
    Pretty,
    /// JSON format for log aggregation
    Json,
}

/// Initialize logging with the given level and human-readable output
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    init_logging_with(level, LogFormat::Pretty)
}

/// Initialize logging with an explicit output format
pub fn init_logging_with(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    Ok(())
}
