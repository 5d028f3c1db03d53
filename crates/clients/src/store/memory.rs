// Path: crates/clients/src/store/memory.rs
use async_trait::async_trait;
use bridge_api::ProposalStore;
use bridge_types::error::BridgeError;
use bridge_types::{ProposalRecord, SubmissionUpdate};
use dashmap::DashMap;
use std::sync::Arc;

/// A process-local proposal store. Records are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryProposalStore {
    records: Arc<DashMap<String, ProposalRecord>>,
}

impl MemoryProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `records`, as the upstream indexer would leave it.
    pub fn with_records(records: impl IntoIterator<Item = ProposalRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store
                .records
                .insert(record.contract_address.clone(), record);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Edits the stored row in place, as an external writer would. Returns
    /// false if no row exists.
    pub fn update(&self, contract_address: &str, edit: impl FnOnce(&mut ProposalRecord)) -> bool {
        match self.records.get_mut(contract_address) {
            Some(mut entry) => {
                edit(entry.value_mut());
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ProposalStore for MemoryProposalStore {
    async fn get(&self, contract_address: &str) -> Result<Option<ProposalRecord>, BridgeError> {
        Ok(self
            .records
            .get(contract_address)
            .map(|entry| entry.value().clone()))
    }

    async fn get_all(&self) -> Result<Vec<ProposalRecord>, BridgeError> {
        let mut all: Vec<ProposalRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.contract_address.cmp(&b.contract_address));
        Ok(all)
    }

    async fn put(&self, update: SubmissionUpdate) -> Result<(), BridgeError> {
        self.records
            .entry(update.contract_address.clone())
            .and_modify(|record| update.apply_to(record))
            .or_insert_with(|| update.clone().into_record());
        Ok(())
    }
}
