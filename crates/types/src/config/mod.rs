// Path: crates/types/src/config/mod.rs

//! Configuration for the bridge process, loaded from `bridge.toml` and then
//! overridden from the command line and environment.
use crate::error::BridgeError;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Socket address the HTTP gateway binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Base URL of the governance front-end; proposal links are `<base_url>proposals/<id>`.
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub forum: ForumConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub gateway: GatewayLimits,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            base_url: String::new(),
            forum: ForumConfig::default(),
            chain: ChainConfig::default(),
            store: StoreConfig::default(),
            reconcile: ReconcileConfig::default(),
            gateway: GatewayLimits::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Forum (Discord) connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumConfig {
    /// Id of the forum channel proposal threads are opened in.
    #[serde(default)]
    pub channel_id: String,
    /// Bot credential. Usually supplied through `DISCORD_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_forum_api_base")]
    pub api_base: String,
    /// Minutes of inactivity before a new thread is auto-archived.
    #[serde(default = "default_auto_archive_minutes")]
    pub auto_archive_minutes: u32,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            bot_token: String::new(),
            api_base: default_forum_api_base(),
            auto_archive_minutes: default_auto_archive_minutes(),
        }
    }
}

/// Chain node settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_chain_api_url")]
    pub api_url: String,
    /// Contract holding governance parameters, `<address>.<contract-name>`.
    #[serde(default)]
    pub submission_contract: String,
    /// Parameter key holding the voting window length in blocks.
    #[serde(default = "default_duration_key")]
    pub duration_key: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            api_url: default_chain_api_url(),
            submission_contract: String::new(),
            duration_key: default_duration_key(),
        }
    }
}

/// Selects the proposal store implementation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// A PostgREST-compatible HTTP API.
    #[default]
    Rest,
    /// A process-local map, for development.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_store_table")]
    pub table: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: String::new(),
            table: default_store_table(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Seconds between reconciliation runs. `0` disables the job.
    #[serde(default = "default_reconcile_interval")]
    pub interval_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_reconcile_interval(),
        }
    }
}

/// Middleware limits for the HTTP gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayLimits {
    #[serde(default = "default_body_limit_kb")]
    pub body_limit_kb: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
}

impl GatewayLimits {
    /// `body_limit_kb` in bytes, or `None` if it does not fit in `usize`.
    pub fn body_limit_bytes(&self) -> Option<usize> {
        self.body_limit_kb.checked_mul(1024)
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if self.concurrency_limit == 0 {
            return Err(BridgeError::Config(
                "gateway.concurrency_limit must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(BridgeError::Config(
                "gateway.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        match self.body_limit_bytes() {
            Some(bytes) if bytes > 0 => Ok(()),
            _ => Err(BridgeError::Config(format!(
                "gateway.body_limit_kb must be between 1 and {}, got {}",
                usize::MAX / 1024,
                self.body_limit_kb
            ))),
        }
    }
}

impl Default for GatewayLimits {
    fn default() -> Self {
        Self {
            body_limit_kb: default_body_limit_kb(),
            request_timeout_secs: default_request_timeout_secs(),
            concurrency_limit: default_concurrency_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_forum_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}
fn default_auto_archive_minutes() -> u32 {
    1440
}
fn default_chain_api_url() -> String {
    "https://api.mainnet.hiro.so".to_string()
}
fn default_duration_key() -> String {
    "proposalDuration".to_string()
}
fn default_store_table() -> String {
    "proposals".to_string()
}
fn default_reconcile_interval() -> u64 {
    300
}
fn default_body_limit_kb() -> usize {
    10 * 1024
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_concurrency_limit() -> usize {
    64
}
fn default_true() -> bool {
    true
}

impl BridgeConfig {
    /// Checks that every value without a usable default has been supplied.
    pub fn validate(&self) -> Result<(), BridgeError> {
        let mut missing = Vec::new();
        if self.forum.channel_id.trim().is_empty() {
            missing.push("forum.channel_id (FORUM_CHANNEL_ID)");
        }
        if self.forum.bot_token.trim().is_empty() {
            missing.push("forum.bot_token (DISCORD_BOT_TOKEN)");
        }
        if self.chain.submission_contract.trim().is_empty() {
            missing.push("chain.submission_contract (SUBMISSION_CONTRACT)");
        }
        if self.base_url.trim().is_empty() {
            missing.push("base_url (BASE_URL)");
        }
        if self.store.backend == StoreBackend::Rest && self.store.url.trim().is_empty() {
            missing.push("store.url (STORE_URL)");
        }
        if !missing.is_empty() {
            return Err(BridgeError::Config(format!(
                "missing required values: {}",
                missing.join(", ")
            )));
        }
        if !self.chain.submission_contract.contains('.') {
            return Err(BridgeError::Config(format!(
                "chain.submission_contract must be '<address>.<contract-name>', got '{}'",
                self.chain.submission_contract
            )));
        }
        self.gateway.validate()
    }
}
