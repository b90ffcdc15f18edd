//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_connections_accepted_total` (counter)
//! - `http_active_connections` (gauge)
//! - `http_parse_errors_total` (counter): by error kind
//! - `http_requests_total` (counter): by method, unknown methods as `OTHER`
//! - `http_request_duration_seconds` (histogram): parse start to handler return
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_connection_accepted() {
    metrics::counter!("http_connections_accepted_total").increment(1);
}

pub fn set_active_connections(count: u64) {
    metrics::gauge!("http_active_connections").set(count as f64);
}

pub fn record_parse_error(kind: &'static str) {
    metrics::counter!("http_parse_errors_total", "kind" => kind).increment(1);
}

pub fn record_request(method: &str, start: Instant) {
    metrics::counter!("http_requests_total", "method" => method_label(method)).increment(1);
    metrics::histogram!("http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// The method as a label value. Clients choose the method, so anything
/// outside the standard set collapses into one series.
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => "OTHER",
    }
}
