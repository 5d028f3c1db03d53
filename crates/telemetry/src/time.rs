// Path: crates/telemetry/src/time.rs
use crate::sinks::{reconcile_metrics, ReconcileMetricsSink};
use std::time::Instant;

/// Records one reconciliation run when dropped: its duration, and a run
/// counted as `aborted` unless [`RunTimer::succeeded`] was called first.
pub struct RunTimer {
    sink: &'static dyn ReconcileMetricsSink,
    start: Instant,
    result: &'static str,
}

impl RunTimer {
    pub fn start() -> Self {
        Self {
            sink: reconcile_metrics(),
            start: Instant::now(),
            result: "aborted",
        }
    }

    pub fn succeeded(&mut self) {
        self.result = "ok";
    }
}

impl Drop for RunTimer {
    fn drop(&mut self) {
        self.sink
            .observe_run_duration(self.start.elapsed().as_secs_f64());
        self.sink.inc_runs(self.result);
    }
}
