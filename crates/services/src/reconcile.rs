// Path: crates/services/src/reconcile.rs
//! Periodic status reconciliation.
//!
//! Each run recomputes every eligible proposal's [`ProposalStatus`] from the
//! chain tip and overwrites the thread's applied tags with the matching set.
//! Nothing is written back to the store. Status is never persisted, so a
//! failed update is simply retried by the next run.

use crate::context::BridgeContext;
use crate::lifecycle::{derive_status, status_tag_ids};
use crate::record_error;
use bridge_telemetry::reconcile_metrics;
use bridge_telemetry::time::RunTimer;
use bridge_types::error::BridgeError;
use bridge_types::forum::ForumChannel;
use bridge_types::proposal::ReconcileTarget;
use bridge_types::ProposalStatus;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;

/// Per-run tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Threads whose tag set was re-applied.
    pub updated: usize,
    /// Records without both heights and a thread id.
    pub skipped: usize,
    /// Proposals whose height fetch or tag update failed.
    pub failed: usize,
}

/// Performs one reconciliation pass.
///
/// Fails only if the forum channel or the proposal table cannot be read; in
/// that case no thread is touched. Per-proposal failures are logged, counted
/// in the report, and do not affect other proposals.
pub async fn reconcile_once(ctx: &BridgeContext) -> Result<ReconcileReport, BridgeError> {
    let channel = ctx.forum.get_channel(&ctx.settings.forum_channel_id).await?;
    let records = ctx.store.get_all().await?;

    let mut report = ReconcileReport::default();
    let targets: Vec<ReconcileTarget> = records
        .iter()
        .filter_map(|record| {
            let target = record.reconcile_target();
            if target.is_none() {
                report.skipped += 1;
            }
            target
        })
        .collect();

    let results = join_all(targets.iter().map(|target| {
        let span = tracing::debug_span!(
            "reconcile_proposal",
            proposal = %target.contract_address,
            thread_id = %target.thread_id
        );
        reconcile_proposal(ctx, &channel, target).instrument(span)
    }))
    .await;

    for (target, result) in targets.iter().zip(results) {
        match result {
            Ok(status) => {
                report.updated += 1;
                reconcile_metrics().inc_tag_updates(status.metric_label(), "ok");
                tracing::debug!(
                    target: "reconcile",
                    proposal = %target.contract_address,
                    %status,
                    "thread tags applied"
                );
            }
            Err((status, e)) => {
                report.failed += 1;
                record_error(&e);
                reconcile_metrics().inc_tag_updates(
                    status.map_or("unknown", |s| s.metric_label()),
                    "error",
                );
                tracing::warn!(
                    target: "reconcile",
                    proposal = %target.contract_address,
                    thread_id = %target.thread_id,
                    error = %e,
                    "failed to reconcile proposal"
                );
            }
        }
    }

    Ok(report)
}

/// Derives and applies one proposal's status. On failure the status is
/// returned alongside the error when it was already known.
async fn reconcile_proposal(
    ctx: &BridgeContext,
    channel: &ForumChannel,
    target: &ReconcileTarget,
) -> Result<ProposalStatus, (Option<ProposalStatus>, BridgeError)> {
    let current_height = ctx
        .chain
        .current_block_height()
        .await
        .map_err(|e| (None, e))?;
    let status = derive_status(
        current_height,
        target.start_block_height,
        target.end_block_height,
        target.concluded,
    );
    ctx.forum
        .update_thread_tags(&target.thread_id, status_tag_ids(channel, status))
        .await
        .map_err(|e| (Some(status), e))?;
    Ok(status)
}

/// Runs one pass, logging and counting its outcome.
async fn run_reconciliation(ctx: &BridgeContext) {
    let mut timer = RunTimer::start();
    match reconcile_once(ctx).await {
        Ok(report) => {
            timer.succeeded();
            tracing::info!(
                target: "reconcile",
                updated = report.updated,
                skipped = report.skipped,
                failed = report.failed,
                "reconciliation run complete"
            );
        }
        Err(e) => {
            record_error(&e);
            tracing::error!(target: "reconcile", error = %e, "reconciliation run aborted");
        }
    }
}

/// Drives [`reconcile_once`] every `interval` until `shutdown_rx` flips to
/// `true` or its sender is dropped. The first run starts immediately.
///
/// Each run is spawned as its own task, so a stalled external call never
/// delays later ticks. Runs may therefore overlap. A zero interval disables the
/// job.
pub async fn run_reconciler(
    ctx: Arc<BridgeContext>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    if interval.is_zero() {
        tracing::info!(target: "reconcile", "reconciliation disabled (zero interval)");
        return;
    }

    tracing::info!(
        target: "reconcile",
        "reconciler started ({}s interval)",
        interval.as_secs()
    );
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let ctx = ctx.clone();
                tokio::spawn(
                    async move { run_reconciliation(&ctx).await }
                        .instrument(tracing::info_span!("reconcile_run")),
                );
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!(target: "reconcile", "reconciler stopped");
}
