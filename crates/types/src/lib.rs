// Path: crates/types/src/lib.rs
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
//! # Forum Bridge Types
//!
//! Core data structures shared by every crate of the proposal forum bridge:
//! the persisted proposal record, the derived lifecycle status, the inbound
//! webhook payload, forum-side tag and thread shapes, configuration, and the
//! error taxonomy.

/// Configuration structures loaded from TOML and the environment.
pub mod config;
/// The error taxonomy and stable error codes.
pub mod error;
/// Inbound blockchain event payloads delivered by the indexer webhook.
pub mod events;
/// Forum-side shapes: channels, tags and threads.
pub mod forum;
/// The proposal record and its lifecycle status.
pub mod proposal;

pub use error::{BridgeError, ErrorCode};
pub use proposal::{ProposalRecord, ProposalStatus, ReconcileTarget, SubmissionUpdate};
