//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dashboard_requests_total` (counter): requests by resolving stage and status
//!
//! Recording is a no-op until a recorder is installed, so the handler chain
//! records unconditionally.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one request resolved by `stage` with `status`.
pub fn record_resolved(stage: &'static str, status: u16) {
    metrics::counter!(
        "dashboard_requests_total",
        "stage" => stage,
        "status" => status.to_string()
    )
    .increment(1);
}
