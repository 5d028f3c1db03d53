// Path: crates/test_utils/src/lib.rs
//! Collaborator doubles shared by the bridge's test suites.
//!
//! Every double records the calls made to it so tests can assert on exactly
//! which external effects a run produced.

use async_trait::async_trait;
use bridge_api::{ChainApi, ForumApi, ProposalStore};
use bridge_clients::MemoryProposalStore;
use bridge_types::error::BridgeError;
use bridge_types::forum::{CreatedThread, ForumChannel, ForumTag, NewThread};
use bridge_types::{ProposalRecord, SubmissionUpdate};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A forum channel carrying every lifecycle tag plus one unrelated tag.
pub fn forum_channel() -> ForumChannel {
    let tags = [
        ("t-proposal", "Proposal"),
        ("t-pending", "Pending"),
        ("t-live", "Live"),
        ("t-ready", "Ready to Execute"),
        ("t-concluded", "Concluded"),
        ("t-announce", "Announcement"),
    ];
    ForumChannel {
        available_tags: tags
            .iter()
            .map(|(id, name)| ForumTag {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect(),
    }
}

/// A forum that keeps created threads and tag updates in memory.
pub struct MockForum {
    channel: ForumChannel,
    next_thread: AtomicU64,
    channel_reads: AtomicUsize,
    fail_channel: AtomicBool,
    fail_create: AtomicBool,
    failing_threads: Mutex<HashSet<String>>,
    threads: Mutex<Vec<(String, NewThread, String)>>,
    tag_updates: Mutex<Vec<(String, Vec<String>)>>,
}

impl Default for MockForum {
    fn default() -> Self {
        Self::with_channel(forum_channel())
    }
}

impl MockForum {
    pub fn with_channel(channel: ForumChannel) -> Self {
        Self {
            channel,
            next_thread: AtomicU64::new(1000),
            channel_reads: AtomicUsize::new(0),
            fail_channel: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            failing_threads: Mutex::default(),
            threads: Mutex::default(),
            tag_updates: Mutex::default(),
        }
    }

    /// Makes every channel read fail.
    pub fn fail_channel_reads(&self) {
        self.fail_channel.store(true, Ordering::SeqCst);
    }

    /// Makes every thread creation fail.
    pub fn fail_thread_creation(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    /// Makes tag updates on `thread_id` fail.
    pub fn fail_tag_updates_for(&self, thread_id: &str) {
        self.failing_threads
            .lock()
            .unwrap()
            .insert(thread_id.to_string());
    }

    pub fn channel_reads(&self) -> usize {
        self.channel_reads.load(Ordering::SeqCst)
    }

    /// `(channel_id, thread, assigned_thread_id)` for every created thread.
    pub fn created_threads(&self) -> Vec<(String, NewThread, String)> {
        self.threads.lock().unwrap().clone()
    }

    /// `(thread_id, tag_ids)` for every successful tag update, in call order.
    pub fn tag_updates(&self) -> Vec<(String, Vec<String>)> {
        self.tag_updates.lock().unwrap().clone()
    }

    /// The most recent tag set applied to `thread_id`.
    pub fn applied_tags(&self, thread_id: &str) -> Option<Vec<String>> {
        self.tag_updates
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| id == thread_id)
            .map(|(_, tags)| tags.clone())
    }
}

#[async_trait]
impl ForumApi for MockForum {
    async fn get_channel(&self, _channel_id: &str) -> Result<ForumChannel, BridgeError> {
        self.channel_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_channel.load(Ordering::SeqCst) {
            return Err(BridgeError::external("forum", "HTTP 503 from GET channel"));
        }
        Ok(self.channel.clone())
    }

    async fn create_thread(
        &self,
        channel_id: &str,
        thread: NewThread,
    ) -> Result<CreatedThread, BridgeError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(BridgeError::external("forum", "HTTP 500 from POST threads"));
        }
        let id = self.next_thread.fetch_add(1, Ordering::SeqCst).to_string();
        self.threads
            .lock()
            .unwrap()
            .push((channel_id.to_string(), thread, id.clone()));
        Ok(CreatedThread { id })
    }

    async fn update_thread_tags(
        &self,
        thread_id: &str,
        tag_ids: Vec<String>,
    ) -> Result<(), BridgeError> {
        if self.failing_threads.lock().unwrap().contains(thread_id) {
            return Err(BridgeError::external("forum", "HTTP 403 from PATCH channel"));
        }
        self.tag_updates
            .lock()
            .unwrap()
            .push((thread_id.to_string(), tag_ids));
        Ok(())
    }
}

/// A chain with a settable tip height and parameter table.
#[derive(Default)]
pub struct MockChain {
    height: AtomicU64,
    parameters: Mutex<HashMap<(String, String), u64>>,
    fail_height: AtomicBool,
    height_calls: AtomicUsize,
    parameter_calls: AtomicUsize,
}

impl MockChain {
    pub fn at_height(height: u64) -> Self {
        let chain = Self::default();
        chain.set_height(height);
        chain
    }

    pub fn with_parameter(self, contract: &str, key: &str, value: u64) -> Self {
        self.parameters
            .lock()
            .unwrap()
            .insert((contract.to_string(), key.to_string()), value);
        self
    }

    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn fail_height_reads(&self) {
        self.fail_height.store(true, Ordering::SeqCst);
    }

    pub fn height_calls(&self) -> usize {
        self.height_calls.load(Ordering::SeqCst)
    }

    pub fn parameter_calls(&self) -> usize {
        self.parameter_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainApi for MockChain {
    async fn get_parameter(&self, contract: &str, key: &str) -> Result<u64, BridgeError> {
        self.parameter_calls.fetch_add(1, Ordering::SeqCst);
        self.parameters
            .lock()
            .unwrap()
            .get(&(contract.to_string(), key.to_string()))
            .copied()
            .ok_or_else(|| BridgeError::NotFound(format!("{contract}::{key}")))
    }

    async fn current_block_height(&self) -> Result<u64, BridgeError> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_height.load(Ordering::SeqCst) {
            return Err(BridgeError::external("chain", "HTTP 502 from /v2/info"));
        }
        Ok(self.height.load(Ordering::SeqCst))
    }
}

type RowEdit = Box<dyn Fn(&mut ProposalRecord) + Send + Sync>;

/// A memory store that counts calls and can be switched to failing.
#[derive(Default)]
pub struct MockStore {
    inner: MemoryProposalStore,
    gets: AtomicUsize,
    puts: AtomicUsize,
    fail_all: AtomicBool,
    fail_puts: AtomicBool,
    edit_after_get: Mutex<Option<RowEdit>>,
}

impl MockStore {
    pub fn with_records(records: impl IntoIterator<Item = ProposalRecord>) -> Self {
        Self {
            inner: MemoryProposalStore::with_records(records),
            ..Default::default()
        }
    }

    /// Makes every call fail.
    pub fn fail_everything(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Makes writes fail while reads keep working.
    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    /// Applies `edit` to the stored row right after each single-record read
    /// returns, simulating an external writer racing the caller.
    pub fn edit_after_get(&self, edit: impl Fn(&mut ProposalRecord) + Send + Sync + 'static) {
        *self.edit_after_get.lock().unwrap() = Some(Box::new(edit));
    }

    /// The stored row, read without counting as a call.
    pub fn row(&self, contract_address: &str) -> Option<ProposalRecord> {
        let mut found = None;
        self.inner.update(contract_address, |r| found = Some(r.clone()));
        found
    }

    /// Number of single-record and whole-table reads.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), BridgeError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(BridgeError::external("store", "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProposalStore for MockStore {
    async fn get(&self, contract_address: &str) -> Result<Option<ProposalRecord>, BridgeError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let snapshot = self.inner.get(contract_address).await?;
        if let Some(edit) = self.edit_after_get.lock().unwrap().as_ref() {
            self.inner.update(contract_address, |r| edit(r));
        }
        Ok(snapshot)
    }

    async fn get_all(&self) -> Result<Vec<ProposalRecord>, BridgeError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_all().await
    }

    async fn put(&self, update: SubmissionUpdate) -> Result<(), BridgeError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(BridgeError::external("store", "write rejected"));
        }
        self.inner.put(update).await
    }
}
