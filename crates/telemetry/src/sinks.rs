// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns the configured ingestion metrics sink, or a no-op sink.
pub fn ingest_metrics() -> &'static dyn IngestMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured reconciliation metrics sink, or a no-op sink.
pub fn reconcile_metrics() -> &'static dyn ReconcileMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured error metrics sink, or a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// Metrics for the proposal ingestion handler.
pub trait IngestMetricsSink: Send + Sync + std::fmt::Debug {
    /// Counts one processed transaction, labeled by its outcome.
    fn inc_transactions(&self, outcome: &'static str);
}
impl IngestMetricsSink for NopSink {
    fn inc_transactions(&self, _outcome: &'static str) {}
}

/// Metrics for the status reconciliation job.
pub trait ReconcileMetricsSink: Send + Sync + std::fmt::Debug {
    /// Counts one reconciliation run, labeled by `ok` or `aborted`.
    fn inc_runs(&self, result: &'static str);
    /// Observes the wall-clock duration of one run.
    fn observe_run_duration(&self, duration_secs: f64);
    /// Counts one tag update attempt, labeled by derived status and result.
    fn inc_tag_updates(&self, status: &'static str, result: &'static str);
}
impl ReconcileMetricsSink for NopSink {
    fn inc_runs(&self, _result: &'static str) {}
    fn observe_run_duration(&self, _duration_secs: f64) {}
    fn inc_tag_updates(&self, _status: &'static str, _result: &'static str) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and code.
    fn inc_error(&self, kind: &'static str, code: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _code: &'static str) {}
}

/// A unified sink implementing every domain-specific trait.
pub trait MetricsSink: IngestMetricsSink + ReconcileMetricsSink + ErrorMetricsSink {}

impl<T> MetricsSink for T where T: IngestMetricsSink + ReconcileMetricsSink + ErrorMetricsSink {}
