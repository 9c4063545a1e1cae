//! Metrics collection and exposition.
//!
//! # Metrics
//! - `users_api_requests_total` (counter): requests by route, method, status
//! - `users_api_rate_limited_total` (counter): rejections by partition
//! - `users_api_faults_total` (counter): panics translated to 500
//!
//! Without an installed recorder every call is a no-op, so tests and
//! deployments with the exporter disabled pay nothing.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16) {
    metrics::counter!(
        "users_api_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_rate_limited(partition: &str) {
    metrics::counter!("users_api_rate_limited_total", "partition" => partition.to_string())
        .increment(1);
}

pub fn record_fault() {
    metrics::counter!("users_api_faults_total").increment(1);
}
