// Path: crates/services/src/lifecycle.rs
//! Lifecycle status derivation and the tag set that represents it.

use bridge_types::forum::ForumChannel;
use bridge_types::proposal::PROPOSAL_TAG;
use bridge_types::ProposalStatus;

/// Derives a proposal's status at `current_height`. The first matching rule wins:
///
/// 1. `concluded` → [`ProposalStatus::Concluded`]
/// 2. past the window → [`ProposalStatus::ReadyToExecute`]
/// 3. inside the inclusive window → [`ProposalStatus::Live`]
/// 4. otherwise → [`ProposalStatus::Pending`]
pub fn derive_status(
    current_height: u64,
    start_height: u64,
    end_height: u64,
    concluded: bool,
) -> ProposalStatus {
    if concluded {
        ProposalStatus::Concluded
    } else if current_height > end_height {
        ProposalStatus::ReadyToExecute
    } else if current_height >= start_height {
        ProposalStatus::Live
    } else {
        ProposalStatus::Pending
    }
}

/// The tag ids a thread in `status` should carry: the fixed proposal tag plus
/// the status tag. Any other tag currently applied is dropped by the update.
pub fn status_tag_ids(channel: &ForumChannel, status: ProposalStatus) -> Vec<String> {
    channel.tag_ids_for(&[PROPOSAL_TAG, status.tag_name()])
}

/// Tag ids for a freshly opened proposal thread.
pub fn initial_tag_ids(channel: &ForumChannel) -> Vec<String> {
    status_tag_ids(channel, ProposalStatus::Pending)
}
