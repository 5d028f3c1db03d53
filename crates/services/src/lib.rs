// Path: crates/services/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Forum Bridge Services
//!
//! The two jobs that keep the governance forum in step with the chain:
//!
//! - [`ingest`]: turns successful proposal-submission transactions into forum
//!   threads, exactly once per proposal record.
//! - [`reconcile`]: periodically recomputes each proposal's lifecycle status
//!   from the chain tip and re-applies the matching thread tags.
//!
//! Both share nothing in-process beyond the [`BridgeContext`] handed to them at
//! startup; they coordinate only through the proposal store.

pub mod context;
pub mod ingest;
pub mod lifecycle;
pub mod parser;
pub mod reconcile;

pub use context::{BridgeContext, BridgeSettings};
pub use ingest::{ingest_batch, IngestOutcome, IngestReport};
pub use lifecycle::derive_status;
pub use parser::{parse_description, ProposalCall};
pub use reconcile::{reconcile_once, run_reconciler, ReconcileReport};

use bridge_telemetry::error_metrics;
use bridge_types::error::{BridgeError, ErrorCode};

/// Counts an error by kind and code.
pub(crate) fn record_error(err: &BridgeError) {
    error_metrics().inc_error(err.kind(), err.code());
}
