// Path: crates/telemetry/src/http.rs
use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderName},
};
use prometheus::{Encoder, TextEncoder};

/// Renders every registered collector in the Prometheus text format.
pub async fn metrics_handler() -> ([(HeaderName, String); 1], Bytes) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::with_capacity(64 * 1024);
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::error!(target: "telemetry", error = %e, "Failed to encode prometheus metrics");
    }
    (
        [(CONTENT_TYPE, encoder.format_type().to_string())],
        buf.into(),
    )
}
