// Path: crates/types/src/events.rs
//! Inbound payloads posted by the chain indexer webhook.
//!
//! Only the fields the bridge reads are modelled; everything else in the
//! indexer's payload is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Substring of `metadata.result` marking a successful contract call, e.g. `(ok true)`.
pub const SUCCESS_MARKER: &str = "true";

/// Body of `POST /api/add-proposal`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyPayload {
    #[serde(default)]
    pub apply: Vec<ApplyBlock>,
}

/// One applied block and the transactions matched in it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyBlock {
    #[serde(default)]
    pub transactions: Vec<ChainTransaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainTransaction {
    pub metadata: TransactionMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionMetadata {
    /// Printed Clarity result of the call, e.g. `(ok true)`.
    #[serde(default)]
    pub result: String,
    /// Printed contract call, e.g. `(propose SP...prop-42, u100)`.
    #[serde(default)]
    pub description: String,
    /// Principal that sent the transaction.
    #[serde(default)]
    pub sender: String,
}

impl ChainTransaction {
    pub fn is_successful(&self) -> bool {
        self.metadata.result.contains(SUCCESS_MARKER)
    }
}

impl ApplyPayload {
    /// Total transactions in the batch, successful or not.
    pub fn transaction_count(&self) -> usize {
        self.apply.iter().map(|block| block.transactions.len()).sum()
    }

    /// Consumes the payload, yielding every transaction in block order.
    pub fn into_transactions(self) -> impl Iterator<Item = ChainTransaction> {
        self.apply.into_iter().flat_map(|block| block.transactions)
    }
}
