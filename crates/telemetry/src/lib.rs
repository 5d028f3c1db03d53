// Path: crates/telemetry/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Forum Bridge Telemetry
//!
//! Structured logging initialization, Prometheus collectors, and abstract
//! sinks that keep the core logic independent of the metrics backend.

/// The `/metrics` text exposition handler.
pub mod http;
/// The initialization routine for global structured logging.
pub mod init;
/// The concrete implementation of metrics sinks using the `prometheus` crate.
pub mod prometheus;
/// Abstract traits (`*MetricsSink`) that define the contract for metrics reporting.
pub mod sinks;
/// Drop-based recording of reconciliation run duration and result.
pub mod time;

pub use sinks::{error_metrics, ingest_metrics, reconcile_metrics};
