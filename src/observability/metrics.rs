//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): proxied requests by route, backend, status
//! - `gateway_request_duration_seconds` (histogram): time to upstream response head
//! - `gateway_upstream_errors_total` (counter): failed upstream calls by kind
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Prometheus exposition is opt-in via config

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a request that got an upstream response.
pub fn record_request(route: &str, backend: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "route" => route.to_string(),
        "backend" => backend.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a failed upstream call and the status returned for it.
pub fn record_upstream_error(route: &str, backend: &str, kind: &'static str, status: u16) {
    counter!(
        "gateway_upstream_errors_total",
        "route" => route.to_string(),
        "backend" => backend.to_string(),
        "kind" => kind
    )
    .increment(1);

    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
