//! Telemetry module
//!
//! Logging, Prometheus metrics, and distributed tracing for the pipeline.

mod logging;
mod metrics;
mod tracing_setup;

pub use logging::{init_logging, init_logging_with, LogFormat};
pub use metrics::{
    record_listing_detected, record_order_confirmed, record_order_failed,
    record_order_resubmitted, record_order_submitted,
};
pub use tracing_setup::init_tracing;

use crate::config::TelemetryConfig;

/// Handle that keeps telemetry alive for the process lifetime
pub struct TelemetryGuard {
    _priv: (),
}

/// Bring up logging, span export, and the metrics endpoint in one call.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level)?;

    if let Some(ref endpoint) = config.otlp_endpoint {
        init_tracing(endpoint)?;
    }

    metrics::init_metrics(config.metrics_port)?;

    Ok(TelemetryGuard { _priv: () })
}
