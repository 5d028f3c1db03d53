// Path: crates/node/src/bin/forum-bridge.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

use anyhow::{Context, Result};
use bridge_api::{ChainApi, ForumApi, ProposalStore};
use bridge_clients::{DiscordForum, MemoryProposalStore, RestProposalStore, StacksChain};
use bridge_services::{run_reconciler, BridgeContext, BridgeSettings};
use bridge_types::config::{BridgeConfig, StoreBackend};
use clap::Parser;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Parser, Debug, Default)]
#[clap(name = "forum-bridge", about = "Mirrors on-chain DAO proposals into a Discord forum")]
struct BridgeOpts {
    /// Optional TOML configuration file. Every key has a default or an override below.
    #[clap(long, env = "BRIDGE_CONFIG")]
    config: Option<PathBuf>,
    #[clap(long, env = "PORT", help = "Listen on 0.0.0.0:<PORT>")]
    port: Option<u16>,
    #[clap(long, env = "LISTEN_ADDR", help = "Overrides listen_addr; wins over --port")]
    listen_addr: Option<String>,
    #[clap(long, env = "FORUM_CHANNEL_ID")]
    forum_channel_id: Option<String>,
    #[clap(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    discord_bot_token: Option<String>,
    #[clap(long, env = "SUBMISSION_CONTRACT")]
    submission_contract: Option<String>,
    #[clap(long, env = "BASE_URL")]
    base_url: Option<String>,
    #[clap(long, env = "CHAIN_API_URL")]
    chain_api_url: Option<String>,
    #[clap(long, env = "STORE_URL")]
    store_url: Option<String>,
    #[clap(long, env = "STORE_API_KEY", hide_env_values = true)]
    store_api_key: Option<String>,
    #[clap(long, env = "RECONCILE_INTERVAL_SECS")]
    reconcile_interval_secs: Option<u64>,
}

/// Reads the config file if one was given, otherwise starts from defaults.
fn read_config_file(path: Option<&Path>) -> Result<BridgeConfig> {
    let Some(path) = path else {
        return Ok(BridgeConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Applies CLI/env overrides on top of the file values.
fn apply_overrides(config: &mut BridgeConfig, opts: BridgeOpts) {
    if let Some(port) = opts.port {
        config.listen_addr = format!("0.0.0.0:{port}");
    }
    if let Some(addr) = opts.listen_addr {
        config.listen_addr = addr;
    }
    if let Some(v) = opts.forum_channel_id {
        config.forum.channel_id = v;
    }
    if let Some(v) = opts.discord_bot_token {
        config.forum.bot_token = v;
    }
    if let Some(v) = opts.submission_contract {
        config.chain.submission_contract = v;
    }
    if let Some(v) = opts.base_url {
        config.base_url = v;
    }
    if let Some(v) = opts.chain_api_url {
        config.chain.api_url = v;
    }
    if let Some(v) = opts.store_url {
        config.store.url = v;
    }
    if let Some(v) = opts.store_api_key {
        config.store.api_key = v;
    }
    if let Some(v) = opts.reconcile_interval_secs {
        config.reconcile.interval_secs = v;
    }
}

fn load_config(opts: BridgeOpts) -> Result<BridgeConfig> {
    let mut config = read_config_file(opts.config.as_deref())?;
    apply_overrides(&mut config, opts);
    config.validate()?;
    Ok(config)
}

fn build_context(config: &BridgeConfig) -> Result<BridgeContext> {
    let store: Arc<dyn ProposalStore> = match config.store.backend {
        StoreBackend::Rest => Arc::new(RestProposalStore::new(
            config.store.url.as_str(),
            &config.store.table,
            config.store.api_key.as_str(),
        )?),
        StoreBackend::Memory => {
            tracing::warn!(target: "node", "using the in-memory proposal store; records are lost on exit");
            Arc::new(MemoryProposalStore::new())
        }
    };
    let forum: Arc<dyn ForumApi> = Arc::new(DiscordForum::new(
        config.forum.api_base.as_str(),
        config.forum.bot_token.as_str(),
    )?);
    let chain: Arc<dyn ChainApi> = Arc::new(StacksChain::new(config.chain.api_url.as_str())?);

    Ok(BridgeContext::new(
        store,
        forum,
        chain,
        BridgeSettings::from_config(config),
    ))
}

/// Flips `shutdown_tx` once `signal` fires. If the signal cannot be installed
/// the sender is kept alive forever, since dropping it would also stop every
/// receiver.
async fn forward_shutdown<F>(signal: F, shutdown_tx: watch::Sender<bool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(target: "node", error = %e, "failed to listen for shutdown signal; running until killed");
        std::future::pending::<()>().await;
        return;
    }
    tracing::info!(target: "node", "shutdown signal received");
    let _ = shutdown_tx.send(true);
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing FIRST
    bridge_telemetry::init::init_tracing()?;

    let opts = BridgeOpts::parse();
    let config = load_config(opts)?;
    tracing::info!(
        target: "node",
        event = "startup",
        listen_addr = %config.listen_addr,
        forum_channel = %config.forum.channel_id,
        store_backend = ?config.store.backend,
        reconcile_interval_secs = config.reconcile.interval_secs
    );

    if config.telemetry.metrics_enabled {
        bridge_telemetry::prometheus::install()?;
    }

    let ctx = Arc::new(build_context(&config)?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reconciler = tokio::spawn(run_reconciler(
        ctx.clone(),
        Duration::from_secs(config.reconcile.interval_secs),
        shutdown_rx.clone(),
    ));

    tokio::spawn(forward_shutdown(tokio::signal::ctrl_c(), shutdown_tx));

    bridge_gateway::run_server(&config, ctx, shutdown_rx).await?;

    if let Err(e) = reconciler.await {
        tracing::error!(target: "node", error = %e, "reconciler task failed");
    }
    tracing::info!(target: "node", "forum bridge stopped");
    Ok(())
}
