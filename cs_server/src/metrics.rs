//! Prometheus metrics for the matchmaking server.
//!
//! Metrics are exposed in Prometheus text format on a separate listener when
//! `METRICS_BIND` is configured. Without an installed recorder every call
//! below is a no-op.
//!
//! # Metrics
//!
//! - `http_requests_total`, `http_request_duration_ms`
//! - `matches_generated_total` by mode
//! - `court_conflicts_total`
//! - `overrides_applied_total`
//! - `match_transitions_total` by target status

use courtside::{MatchMode, MatchStatus};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Matchmaking Metrics
// ============================================================================

/// Count matches persisted by a generation run or a saved lineup.
pub fn matches_generated(mode: MatchMode, count: usize) {
    metrics::counter!("matches_generated_total",
        "mode" => mode.to_string()
    )
    .increment(count as u64);
}

/// Increment the court conflict counter.
pub fn court_conflicts_total() {
    metrics::counter!("court_conflicts_total").increment(1);
}

/// Increment the applied override counter.
pub fn overrides_applied_total() {
    metrics::counter!("overrides_applied_total").increment(1);
}

/// Record a lifecycle transition into `status`.
pub fn match_transitions_total(status: MatchStatus) {
    metrics::counter!("match_transitions_total",
        "status" => status.to_string()
    )
    .increment(1);
}
