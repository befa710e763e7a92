//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (request counts, latency, denials)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_rate_limited_total` (counter): denials by route
//! - `gateway_safety_blocks_total` (counter): denials by code
//! - `gateway_store_failures_total` (counter): fail-open store errors

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(err) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(error = %err, "Failed to install metrics exporter");
        return;
    }
    tracing::info!(address = %addr, "Metrics endpoint started");
}

/// Record one terminal request outcome.
pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a rate-limit denial.
pub fn record_rate_limited(route: &str) {
    counter!("gateway_rate_limited_total", "route" => route.to_string()).increment(1);
}

/// Record a content-safety denial.
pub fn record_safety_block(code: &str) {
    counter!("gateway_safety_blocks_total", "code" => code.to_string()).increment(1);
}

/// Record a fail-open store failure (counter store, audit store).
pub fn record_store_failure(store: &str) {
    counter!("gateway_store_failures_total", "store" => store.to_string()).increment(1);
}
