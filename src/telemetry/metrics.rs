//! Prometheus metrics

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

const LISTINGS_DETECTED: &str = "listing_sniper_listings_detected";
const ORDERS_SUBMITTED: &str = "listing_sniper_orders_submitted";
const ORDERS_FAILED: &str = "listing_sniper_orders_failed";
const ORDERS_CONFIRMED: &str = "listing_sniper_orders_confirmed";
const ORDERS_RESUBMITTED: &str = "listing_sniper_orders_resubmitted";

/// Start the Prometheus exporter on the given port.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {e}"))?;
    Ok(())
}

pub fn record_listing_detected() {
    counter!(LISTINGS_DETECTED).increment(1);
}

pub fn record_order_submitted() {
    counter!(ORDERS_SUBMITTED).increment(1);
}

pub fn record_order_failed() {
    counter!(ORDERS_FAILED).increment(1);
}

pub fn record_order_confirmed() {
    counter!(ORDERS_CONFIRMED).increment(1);
}

pub fn record_order_resubmitted() {
    counter!(ORDERS_RESUBMITTED).increment(1);
}
