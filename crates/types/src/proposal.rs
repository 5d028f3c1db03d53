// Path: crates/types/src/proposal.rs
//! The proposal record as persisted in the external store.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Label of the tag carried by every proposal thread regardless of status.
pub const PROPOSAL_TAG: &str = "Proposal";

/// A governance proposal tracked by the bridge.
///
/// The record is created by an external indexer before ingestion runs. Ingestion
/// fills in the voting window and the thread binding; reconciliation only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProposalRecord {
    /// Fully-qualified on-chain resource name, e.g. `SP3...ABC.prop-42`.
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    /// First block of the voting window (inclusive).
    #[serde(
        rename = "startBlockHeight",
        default,
        deserialize_with = "de_opt_height",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_block_height: Option<u64>,
    /// Last block of the voting window (inclusive).
    #[serde(
        rename = "endBlockHeight",
        default,
        deserialize_with = "de_opt_height",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_block_height: Option<u64>,
    /// Forum thread bound to this proposal once created.
    #[serde(rename = "threadID", default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// True once a thread has been created.
    #[serde(default, deserialize_with = "de_null_bool")]
    pub submitted: bool,
    /// Externally managed terminal flag.
    #[serde(default, deserialize_with = "de_null_bool")]
    pub concluded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The columns ingestion owns, written back once a thread exists. Every other
/// column (`concluded`, `title`, `description`) belongs to external writers and
/// is left untouched by the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionUpdate {
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    #[serde(rename = "startBlockHeight")]
    pub start_block_height: u64,
    #[serde(rename = "endBlockHeight")]
    pub end_block_height: u64,
    #[serde(rename = "threadID")]
    pub thread_id: String,
    pub submitted: bool,
}

impl SubmissionUpdate {
    /// Overwrites the owned columns of `record`, keeping the rest.
    pub fn apply_to(&self, record: &mut ProposalRecord) {
        record.start_block_height = Some(self.start_block_height);
        record.end_block_height = Some(self.end_block_height);
        record.thread_id = Some(self.thread_id.clone());
        record.submitted = self.submitted;
    }

    /// A record holding only the owned columns, for stores that have no row yet.
    pub fn into_record(self) -> ProposalRecord {
        let mut record = ProposalRecord::new(self.contract_address.clone());
        self.apply_to(&mut record);
        record
    }
}

/// The subset of a record the reconciliation job needs, present only once
/// ingestion has bound the proposal to a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileTarget {
    pub contract_address: String,
    pub start_block_height: u64,
    pub end_block_height: u64,
    pub thread_id: String,
    pub concluded: bool,
}

impl ProposalRecord {
    /// Creates a bare record, as the upstream indexer would.
    pub fn new(contract_address: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            ..Default::default()
        }
    }

    /// Returns the reconciliation view of this record, or `None` if either height
    /// or the thread id is still missing.
    pub fn reconcile_target(&self) -> Option<ReconcileTarget> {
        match (
            self.start_block_height,
            self.end_block_height,
            self.thread_id.as_deref(),
        ) {
            (Some(start), Some(end), Some(thread)) if !thread.is_empty() => Some(ReconcileTarget {
                contract_address: self.contract_address.clone(),
                start_block_height: start,
                end_block_height: end,
                thread_id: thread.to_string(),
                concluded: self.concluded,
            }),
            _ => None,
        }
    }
}

/// Lifecycle status of a proposal, recomputed from chain height on every
/// reconciliation run. The variants double as forum tag labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalStatus {
    /// The voting window has not opened yet.
    Pending,
    /// The current height is inside the voting window.
    Live,
    /// The voting window has closed but the proposal is not concluded.
    ReadyToExecute,
    /// The proposal was marked concluded in the store.
    Concluded,
}

impl ProposalStatus {
    /// The forum tag label for this status.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Live => "Live",
            Self::ReadyToExecute => "Ready to Execute",
            Self::Concluded => "Concluded",
        }
    }

    /// Short, label-safe name used for metrics.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Live => "live",
            Self::ReadyToExecute => "ready_to_execute",
            Self::Concluded => "concluded",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

// Heights were historically written as strings by older bridge versions, so
// both JSON numbers and numeric strings are accepted.
fn de_opt_height<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Height {
        Num(u64),
        Str(String),
    }

    match Option::<Height>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Height::Num(n)) => Ok(Some(n)),
        Some(Height::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Height::Str(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn de_null_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accepts_string_and_numeric_heights() {
        let json = r#"{
            "contractAddress": "SP000.mega-dao.prop-1",
            "startBlockHeight": "100",
            "endBlockHeight": 150,
            "threadID": "998877",
            "submitted": true,
            "concluded": null,
            "title": "Fund the thing"
        }"#;
        let record: ProposalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.start_block_height, Some(100));
        assert_eq!(record.end_block_height, Some(150));
        assert_eq!(record.thread_id.as_deref(), Some("998877"));
        assert!(record.submitted);
        assert!(!record.concluded);
        assert_eq!(record.description, None);
    }

    #[test]
    fn test_record_serializes_store_column_names() {
        let mut record = ProposalRecord::new("SP000.mega-dao.prop-1");
        record.start_block_height = Some(7);
        record.thread_id = Some("42".into());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["contractAddress"], "SP000.mega-dao.prop-1");
        assert_eq!(value["startBlockHeight"], 7);
        assert_eq!(value["threadID"], "42");
        assert!(value.get("endBlockHeight").is_none());
    }

    #[test]
    fn test_reconcile_target_requires_heights_and_thread() {
        let mut record = ProposalRecord::new("a.b");
        assert!(record.reconcile_target().is_none());
        record.start_block_height = Some(1);
        record.end_block_height = Some(2);
        assert!(record.reconcile_target().is_none());
        record.thread_id = Some(String::new());
        assert!(record.reconcile_target().is_none());
        record.thread_id = Some("t".into());
        let target = record.reconcile_target().unwrap();
        assert_eq!(target.thread_id, "t");
        assert_eq!(target.end_block_height, 2);
    }

    #[test]
    fn test_submission_update_serializes_only_owned_columns() {
        let update = SubmissionUpdate {
            contract_address: "dao.prop-1".into(),
            start_block_height: 100,
            end_block_height: 150,
            thread_id: "77".into(),
            submitted: true,
        };
        let value = serde_json::to_value(&update).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["contractAddress", "endBlockHeight", "startBlockHeight", "submitted", "threadID"]
        );

        let mut record = ProposalRecord {
            concluded: true,
            title: Some("kept".into()),
            ..ProposalRecord::new("dao.prop-1")
        };
        update.apply_to(&mut record);
        assert!(record.concluded);
        assert_eq!(record.title.as_deref(), Some("kept"));
        assert_eq!(record.thread_id.as_deref(), Some("77"));
        assert_eq!(record.end_block_height, Some(150));
    }

    #[test]
    fn test_status_tag_names() {
        assert_eq!(ProposalStatus::ReadyToExecute.tag_name(), "Ready to Execute");
        assert_eq!(ProposalStatus::Concluded.to_string(), "Concluded");
    }
}
