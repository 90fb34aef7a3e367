//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests seen by a proxy, by outcome
//! - `proxy_upstream_duration_seconds` (histogram): time to upstream headers
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is opt-in from the host configuration

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// A request was handed to the next middleware.
pub fn record_delegated() {
    counter!("proxy_requests_total", "outcome" => "delegated").increment(1);
}

/// A request was relayed from the upstream.
pub fn record_proxied(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "outcome" => "proxied",
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_upstream_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Forwarding failed before a response could be relayed.
pub fn record_error(kind: &'static str) {
    counter!("proxy_requests_total", "outcome" => "error", "kind" => kind).increment(1);
}
