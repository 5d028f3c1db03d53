// Path: crates/api/src/lib.rs

//! # Forum Bridge API Crate Lints
//!
//! Panics are disallowed in non-test code.
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
//! # Forum Bridge API
//!
//! The narrow interfaces the core logic uses to reach its three external
//! collaborators: the proposal store, the forum, and the chain node. Concrete
//! adapters live in `bridge-clients`; test doubles in `bridge-test-utils`.

use async_trait::async_trait;
use bridge_types::error::BridgeError;
use bridge_types::forum::{CreatedThread, ForumChannel, NewThread};
use bridge_types::{ProposalRecord, SubmissionUpdate};

/// Persistent proposal records, keyed by `contract_address`.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Fetches one record, or `None` if the indexer has not created it.
    async fn get(&self, contract_address: &str) -> Result<Option<ProposalRecord>, BridgeError>;

    /// Fetches every record.
    async fn get_all(&self) -> Result<Vec<ProposalRecord>, BridgeError>;

    /// Writes the submission columns of the record with the same
    /// `contract_address`, inserting the row if it is missing. Columns outside
    /// [`SubmissionUpdate`] keep whatever value the store holds at write time.
    async fn put(&self, update: SubmissionUpdate) -> Result<(), BridgeError>;
}

/// A forum that hosts one discussion thread per proposal.
#[async_trait]
pub trait ForumApi: Send + Sync {
    /// Reads a forum channel, including its available tags.
    async fn get_channel(&self, channel_id: &str) -> Result<ForumChannel, BridgeError>;

    /// Opens a new thread in a forum channel.
    async fn create_thread(
        &self,
        channel_id: &str,
        thread: NewThread,
    ) -> Result<CreatedThread, BridgeError>;

    /// Replaces the set of tags applied to a thread.
    async fn update_thread_tags(
        &self,
        thread_id: &str,
        tag_ids: Vec<String>,
    ) -> Result<(), BridgeError>;
}

/// Read access to the governance chain.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Reads a numeric governance parameter from `contract` (`<address>.<name>`).
    async fn get_parameter(&self, contract: &str, key: &str) -> Result<u64, BridgeError>;

    /// The current chain tip height.
    async fn current_block_height(&self) -> Result<u64, BridgeError>;
}
