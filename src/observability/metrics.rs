//! Metrics collection and exposition.
//!
//! # Metrics
//! - `storefront_http_requests_total` (counter): requests by method, status
//! - `storefront_http_request_duration_seconds` (histogram): latency by method
//! - `storefront_startup_stage_total` (counter): stage outcomes at boot
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a finished request and record its latency.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "storefront_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "storefront_http_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Count the outcome of a startup stage.
pub fn record_stage(stage: &'static str, outcome: &'static str) {
    counter!("storefront_startup_stage_total", "stage" => stage, "outcome" => outcome).increment(1);
}

/// Middleware recording every response.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
