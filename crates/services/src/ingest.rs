// Path: crates/services/src/ingest.rs
//! Proposal ingestion: one forum thread per newly submitted proposal.
//!
//! A batch is the set of transactions delivered by one webhook call. Every
//! successful transaction is handled independently and concurrently; a failure
//! on one never affects its siblings. The `submitted` flag on the store record
//! is the only guard against duplicate threads. It is read before the thread is
//! created and written after, so two concurrent deliveries of the same event can
//! still both create a thread.

use crate::context::BridgeContext;
use crate::lifecycle::initial_tag_ids;
use crate::parser::parse_description;
use crate::record_error;
use bridge_telemetry::ingest_metrics;
use bridge_types::error::{BridgeError, ParseFailure};
use bridge_types::events::{ApplyPayload, ChainTransaction};
use bridge_types::forum::NewThread;
use bridge_types::{ProposalRecord, SubmissionUpdate};
use futures::future::join_all;
use tracing::Instrument;

/// What happened to one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A thread was created and the record marked submitted.
    Submitted { thread_id: String },
    /// The record already has a thread.
    AlreadySubmitted,
    /// No store record matches the identifier.
    NotFound,
    /// The transaction's result carries no success marker.
    NotSuccessful,
}

impl IngestOutcome {
    fn metric_label(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::AlreadySubmitted => "already_submitted",
            Self::NotFound => "not_found",
            Self::NotSuccessful => "not_successful",
        }
    }
}

/// Per-batch tally of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub received: usize,
    pub submitted: usize,
    pub already_submitted: usize,
    pub not_found: usize,
    pub not_successful: usize,
    pub malformed: usize,
    pub failed: usize,
    /// True when the batch-level lookups failed and no transaction was processed.
    pub aborted: bool,
}

impl IngestReport {
    fn record(&mut self, result: &Result<IngestOutcome, BridgeError>) {
        let label = match result {
            Ok(outcome) => {
                match outcome {
                    IngestOutcome::Submitted { .. } => self.submitted += 1,
                    IngestOutcome::AlreadySubmitted => self.already_submitted += 1,
                    IngestOutcome::NotFound => self.not_found += 1,
                    IngestOutcome::NotSuccessful => self.not_successful += 1,
                }
                outcome.metric_label()
            }
            Err(BridgeError::MalformedEvent(_)) => {
                self.malformed += 1;
                "malformed"
            }
            Err(_) => {
                self.failed += 1;
                "failed"
            }
        };
        ingest_metrics().inc_transactions(label);
    }
}

/// Values looked up once per batch and shared by its transactions.
struct BatchParams {
    initial_tags: Vec<String>,
    proposal_duration: u64,
}

impl BatchParams {
    async fn fetch(ctx: &BridgeContext) -> Result<Self, BridgeError> {
        let settings = &ctx.settings;
        let (channel, proposal_duration) = futures::try_join!(
            ctx.forum.get_channel(&settings.forum_channel_id),
            ctx.chain
                .get_parameter(&settings.submission_contract, &settings.duration_key),
        )?;
        Ok(Self {
            initial_tags: initial_tag_ids(&channel),
            proposal_duration,
        })
    }
}

/// Processes one webhook batch and returns its tally once every transaction
/// has finished. Errors are logged and counted, never propagated.
pub async fn ingest_batch(ctx: &BridgeContext, payload: ApplyPayload) -> IngestReport {
    let mut report = IngestReport {
        received: payload.transaction_count(),
        ..Default::default()
    };

    let (successful, rejected): (Vec<ChainTransaction>, Vec<ChainTransaction>) = payload
        .into_transactions()
        .partition(ChainTransaction::is_successful);
    for _ in &rejected {
        report.record(&Ok(IngestOutcome::NotSuccessful));
    }
    if successful.is_empty() {
        tracing::debug!(target: "ingest", received = report.received, "no successful transactions in batch");
        return report;
    }

    let params = match BatchParams::fetch(ctx).await {
        Ok(params) => params,
        Err(e) => {
            record_error(&e);
            tracing::error!(
                target: "ingest",
                error = %e,
                pending = successful.len(),
                "batch lookups failed; abandoning batch"
            );
            report.failed += successful.len();
            report.aborted = true;
            return report;
        }
    };

    let results = join_all(successful.iter().enumerate().map(|(index, tx)| {
        let span = tracing::info_span!("ingest_tx", index, sender = %tx.metadata.sender);
        ingest_transaction(ctx, &params, tx).instrument(span)
    }))
    .await;

    for result in &results {
        match result {
            Ok(IngestOutcome::Submitted { thread_id }) => {
                tracing::info!(target: "ingest", %thread_id, "proposal thread created")
            }
            Ok(outcome) => tracing::debug!(target: "ingest", ?outcome, "transaction skipped"),
            Err(e) => {
                record_error(e);
                tracing::warn!(target: "ingest", error = %e, "transaction failed");
            }
        }
        report.record(result);
    }

    tracing::info!(target: "ingest", report = ?report, "batch processed");
    report
}

async fn ingest_transaction(
    ctx: &BridgeContext,
    params: &BatchParams,
    tx: &ChainTransaction,
) -> Result<IngestOutcome, BridgeError> {
    let call = parse_description(&tx.metadata.description)?;
    let end_height = call
        .start_height
        .checked_add(params.proposal_duration)
        .ok_or_else(|| ParseFailure::HeightOutOfRange(call.start_height.to_string()))?;

    let Some(record) = ctx.store.get(&call.identifier).await? else {
        return Ok(IngestOutcome::NotFound);
    };
    if record.submitted {
        return Ok(IngestOutcome::AlreadySubmitted);
    }

    let settings = &ctx.settings;
    let thread = NewThread {
        name: thread_name(&call.identifier),
        content: thread_content(
            &tx.metadata.sender,
            &settings.base_url,
            &call.identifier,
            &record,
        ),
        applied_tags: params.initial_tags.clone(),
        auto_archive_minutes: settings.auto_archive_minutes,
    };
    let created = ctx
        .forum
        .create_thread(&settings.forum_channel_id, thread)
        .await?;

    let update = SubmissionUpdate {
        contract_address: call.identifier,
        start_block_height: call.start_height,
        end_block_height: end_height,
        thread_id: created.id.clone(),
        submitted: true,
    };
    if let Err(e) = ctx.store.put(update).await {
        // The thread now exists but the record does not say so; a redelivery
        // of this event will open a second thread.
        tracing::error!(
            target: "ingest",
            thread_id = %created.id,
            error = %e,
            "thread created but record not marked submitted"
        );
        return Err(e);
    }
    Ok(IngestOutcome::Submitted {
        thread_id: created.id,
    })
}

/// `"<name> proposal"`, where `<name>` is the second dot-separated segment of
/// the identifier (the contract name), or the whole identifier if it has none.
pub fn thread_name(identifier: &str) -> String {
    let name = identifier.split('.').nth(1).unwrap_or(identifier);
    format!("{name} proposal")
}

/// Shortens an address to its first and last five characters.
pub fn truncate_address(address: &str) -> String {
    const HEAD: usize = 5;
    const TAIL: usize = 5;
    let len = address.chars().count();
    if len <= HEAD + TAIL {
        return address.to_string();
    }
    let head: String = address.chars().take(HEAD).collect();
    let tail: String = address.chars().skip(len - TAIL).collect();
    format!("{head}...{tail}")
}

/// The opening message of a proposal thread.
pub fn thread_content(
    sender: &str,
    base_url: &str,
    identifier: &str,
    record: &ProposalRecord,
) -> String {
    format!(
        "Heads up! A fresh proposal has just landed.\n proposed by {}\n proposal link: {}proposals/{} \n\n **Title** : {}\n\n **Description** : {}",
        truncate_address(sender),
        base_url,
        identifier,
        record.title.as_deref().unwrap_or_default(),
        record.description.as_deref().unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BridgeSettings;
    use bridge_api::ProposalStore;
    use bridge_test_utils::{MockChain, MockForum, MockStore};
    use bridge_types::events::{ApplyBlock, TransactionMetadata};
    use std::sync::Arc;

    const CONTRACT: &str = "SP000.mega-dao-submission";
    const SENDER: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";

    struct Harness {
        ctx: BridgeContext,
        store: Arc<MockStore>,
        forum: Arc<MockForum>,
        chain: Arc<MockChain>,
    }

    fn harness(records: Vec<ProposalRecord>) -> Harness {
        let store = Arc::new(MockStore::with_records(records));
        let forum = Arc::new(MockForum::default());
        let chain = Arc::new(MockChain::at_height(90).with_parameter(CONTRACT, "proposalDuration", 50));
        let ctx = BridgeContext::new(
            store.clone(),
            forum.clone(),
            chain.clone(),
            BridgeSettings {
                forum_channel_id: "forum-1".into(),
                submission_contract: CONTRACT.into(),
                duration_key: "proposalDuration".into(),
                base_url: "https://dao.example/".into(),
                auto_archive_minutes: 1440,
            },
        );
        Harness {
            ctx,
            store,
            forum,
            chain,
        }
    }

    fn tx(result: &str, description: &str) -> ChainTransaction {
        ChainTransaction {
            metadata: TransactionMetadata {
                result: result.into(),
                description: description.into(),
                sender: SENDER.into(),
            },
        }
    }

    fn payload(txs: Vec<ChainTransaction>) -> ApplyPayload {
        ApplyPayload {
            apply: vec![ApplyBlock { transactions: txs }],
        }
    }

    fn pending_record(id: &str) -> ProposalRecord {
        ProposalRecord {
            title: Some("Fund grants".into()),
            description: Some("Allocate 10k".into()),
            ..ProposalRecord::new(id)
        }
    }

    #[tokio::test]
    async fn test_creates_thread_and_marks_record_submitted() {
        let h = harness(vec![pending_record("dao-1.prop-42")]);
        let report = ingest_batch(
            &h.ctx,
            payload(vec![tx("(ok true)", "(dao-1.prop-42, foo u100) bar")]),
        )
        .await;

        assert_eq!(report.submitted, 1);
        assert_eq!(report.received, 1);

        let threads = h.forum.created_threads();
        assert_eq!(threads.len(), 1);
        let (channel, thread, thread_id) = &threads[0];
        assert_eq!(channel, "forum-1");
        assert_eq!(thread.name, "prop-42 proposal");
        assert_eq!(thread.applied_tags, vec!["t-proposal", "t-pending"]);
        assert_eq!(thread.auto_archive_minutes, 1440);
        assert!(thread.content.contains("proposed by SP2J6...V9EJ7"));
        assert!(thread
            .content
            .contains("proposal link: https://dao.example/proposals/dao-1.prop-42 "));
        assert!(thread.content.contains("**Title** : Fund grants"));
        assert!(thread.content.contains("**Description** : Allocate 10k"));

        let stored = h.store.get("dao-1.prop-42").await.unwrap().unwrap();
        assert!(stored.submitted);
        assert_eq!(stored.start_block_height, Some(100));
        assert_eq!(stored.end_block_height, Some(150));
        assert_eq!(stored.thread_id.as_deref(), Some(thread_id.as_str()));
        assert_eq!(stored.title.as_deref(), Some("Fund grants"));
    }

    #[tokio::test]
    async fn test_repeated_event_creates_exactly_one_thread() {
        let h = harness(vec![pending_record("dao-1.prop-42")]);
        let event = || payload(vec![tx("(ok true)", "(dao-1.prop-42, foo u100) bar")]);

        let first = ingest_batch(&h.ctx, event()).await;
        let second = ingest_batch(&h.ctx, event()).await;

        assert_eq!(first.submitted, 1);
        assert_eq!(second.submitted, 0);
        assert_eq!(second.already_submitted, 1);
        assert_eq!(h.forum.created_threads().len(), 1);
    }

    #[tokio::test]
    async fn test_unsuccessful_transaction_makes_no_external_calls() {
        let h = harness(vec![pending_record("dao-1.prop-42")]);
        let report = ingest_batch(
            &h.ctx,
            payload(vec![tx("(err u401)", "(dao-1.prop-42, foo u100) bar")]),
        )
        .await;

        assert_eq!(report.not_successful, 1);
        assert_eq!(h.store.gets(), 0);
        assert_eq!(h.store.puts(), 0);
        assert_eq!(h.forum.channel_reads(), 0);
        assert!(h.forum.created_threads().is_empty());
        assert_eq!(h.chain.parameter_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_transaction_does_not_stop_siblings() {
        let h = harness(vec![pending_record("dao.prop-1"), pending_record("dao.prop-2")]);
        let report = ingest_batch(
            &h.ctx,
            payload(vec![
                tx("(ok true)", "(dao.prop-1, u10)"),
                tx("(ok true)", "garbage without tokens"),
                tx("(ok true)", "(dao.prop-2, no height)"),
                tx("(ok true)", "(dao.prop-2, u20)"),
            ]),
        )
        .await;

        assert_eq!(report.submitted, 2);
        assert_eq!(report.malformed, 2);
        assert_eq!(h.forum.created_threads().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_proposal_is_skipped() {
        let h = harness(vec![]);
        let report = ingest_batch(&h.ctx, payload(vec![tx("(ok true)", "(dao.ghost, u1)")])).await;
        assert_eq!(report.not_found, 1);
        assert!(h.forum.created_threads().is_empty());
        assert_eq!(h.store.puts(), 0);
    }

    #[tokio::test]
    async fn test_batch_lookup_failure_abandons_batch() {
        let h = harness(vec![pending_record("dao.prop-1")]);
        h.forum.fail_channel_reads();
        let report = ingest_batch(&h.ctx, payload(vec![tx("(ok true)", "(dao.prop-1, u10)")])).await;
        assert!(report.aborted);
        assert_eq!(report.failed, 1);
        assert_eq!(h.store.gets(), 0);
        assert!(h.forum.created_threads().is_empty());
    }

    #[tokio::test]
    async fn test_forum_failure_leaves_record_unsubmitted() {
        let h = harness(vec![pending_record("dao.prop-1")]);
        h.forum.fail_thread_creation();
        let report = ingest_batch(&h.ctx, payload(vec![tx("(ok true)", "(dao.prop-1, u10)")])).await;
        assert_eq!(report.failed, 1);
        assert_eq!(h.store.puts(), 0);
        assert!(!h.store.get("dao.prop-1").await.unwrap().unwrap().submitted);
    }

    #[tokio::test]
    async fn test_store_write_failure_is_reported_after_thread_creation() {
        let h = harness(vec![pending_record("dao.prop-1")]);
        h.store.fail_puts();
        let report = ingest_batch(&h.ctx, payload(vec![tx("(ok true)", "(dao.prop-1, u10)")])).await;
        assert_eq!(report.failed, 1);
        assert_eq!(h.forum.created_threads().len(), 1);
        assert!(!h.store.get("dao.prop-1").await.unwrap().unwrap().submitted);
    }

    #[tokio::test]
    async fn test_write_back_keeps_columns_edited_during_thread_creation() {
        let h = harness(vec![pending_record("dao.prop-1")]);
        h.store.edit_after_get(|row| {
            row.concluded = true;
            row.title = Some("edited title".into());
        });

        let report = ingest_batch(&h.ctx, payload(vec![tx("(ok true)", "(dao.prop-1, u10)")])).await;
        assert_eq!(report.submitted, 1);

        let row = h.store.row("dao.prop-1").unwrap();
        assert!(row.submitted);
        assert!(row.concluded);
        assert_eq!(row.title.as_deref(), Some("edited title"));
        assert_eq!(row.description.as_deref(), Some("Allocate 10k"));
        assert_eq!(row.start_block_height, Some(10));
        assert_eq!(row.end_block_height, Some(60));
        // The thread body reflects the row as read before the edit.
        let threads = h.forum.created_threads();
        assert!(threads[0].1.content.contains("**Title** : Fund grants"));
    }

    #[tokio::test]
    async fn test_end_height_overflow_is_malformed() {
        let h = harness(vec![pending_record("dao.prop-1")]);
        let desc = format!("(dao.prop-1, u{})", u64::MAX);
        let report = ingest_batch(&h.ctx, payload(vec![tx("(ok true)", &desc)])).await;
        assert_eq!(report.malformed, 1);
        assert_eq!(h.store.gets(), 0);
    }

    #[test]
    fn test_thread_name() {
        assert_eq!(thread_name("SP3X.mega-dao.prop-7"), "mega-dao proposal");
        assert_eq!(thread_name("dao-1.prop-42"), "prop-42 proposal");
        assert_eq!(thread_name("standalone"), "standalone proposal");
    }

    #[test]
    fn test_truncate_address() {
        assert_eq!(truncate_address("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7"), "SP2J6...V9EJ7");
        assert_eq!(truncate_address("SHORTADDR1"), "SHORTADDR1");
        assert_eq!(truncate_address(""), "");
    }
}
