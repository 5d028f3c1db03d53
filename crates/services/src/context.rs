// Path: crates/services/src/context.rs
use bridge_api::{ChainApi, ForumApi, ProposalStore};
use bridge_types::config::BridgeConfig;
use std::sync::Arc;

/// Settings both jobs read, resolved once from [`BridgeConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Forum channel proposal threads live in.
    pub forum_channel_id: String,
    /// Contract holding governance parameters.
    pub submission_contract: String,
    /// Parameter key of the voting window length.
    pub duration_key: String,
    /// Front-end base URL, used verbatim as the prefix of proposal links.
    pub base_url: String,
    pub auto_archive_minutes: u32,
}

impl BridgeSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            forum_channel_id: config.forum.channel_id.clone(),
            submission_contract: config.chain.submission_contract.clone(),
            duration_key: config.chain.duration_key.clone(),
            base_url: config.base_url.clone(),
            auto_archive_minutes: config.forum.auto_archive_minutes,
        }
    }
}

/// The process context, constructed once at startup and shared by the
/// ingestion handler and the reconciliation job.
#[derive(Clone)]
pub struct BridgeContext {
    pub store: Arc<dyn ProposalStore>,
    pub forum: Arc<dyn ForumApi>,
    pub chain: Arc<dyn ChainApi>,
    pub settings: BridgeSettings,
}

impl BridgeContext {
    pub fn new(
        store: Arc<dyn ProposalStore>,
        forum: Arc<dyn ForumApi>,
        chain: Arc<dyn ChainApi>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            store,
            forum,
            chain,
            settings,
        }
    }
}
