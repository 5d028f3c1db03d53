// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_histogram, register_int_counter_vec, Histogram, IntCounterVec,
};

static INGEST_TRANSACTIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static RECONCILE_RUNS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static RECONCILE_RUN_DURATION_SECONDS: OnceCell<Histogram> = OnceCell::new();
static TAG_UPDATES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Records into a collector if `install()` has run; otherwise does nothing.
macro_rules! with_metric {
    ($metric:ident, |$m:ident| $body:expr) => {
        if let Some($m) = $metric.get() {
            $body;
        }
    };
}

impl IngestMetricsSink for PrometheusSink {
    fn inc_transactions(&self, outcome: &'static str) {
        with_metric!(INGEST_TRANSACTIONS_TOTAL, |m| m
            .with_label_values(&[outcome])
            .inc());
    }
}

impl ReconcileMetricsSink for PrometheusSink {
    fn inc_runs(&self, result: &'static str) {
        with_metric!(RECONCILE_RUNS_TOTAL, |m| m.with_label_values(&[result]).inc());
    }
    fn observe_run_duration(&self, duration_secs: f64) {
        with_metric!(RECONCILE_RUN_DURATION_SECONDS, |m| m.observe(duration_secs));
    }
    fn inc_tag_updates(&self, status: &'static str, result: &'static str) {
        with_metric!(TAG_UPDATES_TOTAL, |m| m
            .with_label_values(&[status, result])
            .inc());
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, code: &'static str) {
        with_metric!(ERRORS_TOTAL, |m| m.with_label_values(&[kind, code]).inc());
    }
}

/// Registers every collector with the default registry, publishes the sink
/// through [`SINK`], and returns it. Must be called once at startup.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    let _ = INGEST_TRANSACTIONS_TOTAL.set(register_int_counter_vec!(
        "bridge_ingest_transactions_total",
        "Transactions processed by the ingestion handler, by outcome.",
        &["outcome"]
    )?);
    let _ = RECONCILE_RUNS_TOTAL.set(register_int_counter_vec!(
        "bridge_reconcile_runs_total",
        "Reconciliation runs, by result.",
        &["result"]
    )?);
    let _ = RECONCILE_RUN_DURATION_SECONDS.set(register_histogram!(
        "bridge_reconcile_run_duration_seconds",
        "Wall-clock duration of a reconciliation run.",
        exponential_buckets(0.05, 2.0, 12)?
    )?);
    let _ = TAG_UPDATES_TOTAL.set(register_int_counter_vec!(
        "bridge_tag_updates_total",
        "Thread tag updates, by derived status and result.",
        &["status", "result"]
    )?);
    let _ = ERRORS_TOTAL.set(register_int_counter_vec!(
        "bridge_errors_total",
        "Total number of errors, categorized by kind and code.",
        &["kind", "code"]
    )?);

    static PROM_SINK: PrometheusSink = PrometheusSink;
    let _ = SINK.set(&PROM_SINK);
    Ok(&PROM_SINK)
}
