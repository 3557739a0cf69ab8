//! In-memory fakes of the cache store and item source
//!
//! Enabled for this crate's tests and, through the `testing` feature, for
//! downstream test suites. Expiry runs on the tokio clock so tests can use
//! `tokio::time::pause` / `advance` instead of sleeping.

use crate::cache::CacheStore;
use crate::error::{Result, StashError};
use crate::source::ItemSource;
use crate::types::{Item, ItemCollection};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct FakeEntry {
    value: String,
    expires_at: Instant,
}

/// Cache store fake with expiry, call counters and failure switches
#[derive(Debug, Default)]
pub struct FakeCacheStore {
    entries: Mutex<HashMap<String, FakeEntry>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
    fail_gets: AtomicBool,
    fail_sets: AtomicBool,
}

impl FakeCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail like an unreachable store
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` fail
    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of successful writes
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Read an unexpired value without counting it as a lookup
    pub fn peek(&self, key: &str) -> Option<String> {
        self.live_entry(key).map(|entry| entry.value)
    }

    /// Time left before `key` expires, `None` when absent or expired
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        self.live_entry(key)
            .map(|entry| entry.expires_at.saturating_duration_since(Instant::now()))
    }

    fn live_entry(&self, key: &str) -> Option<FakeEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .cloned()
    }
}

#[async_trait]
impl CacheStore for FakeCacheStore {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StashError::cache("fake store is unreachable"));
        }
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(StashError::cache("fake store rejected the write"));
        }

        let entry = FakeEntry {
            value: value.to_string(),
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
        };
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), entry);
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Item source fake serving a fixed set of rows
#[derive(Debug, Default)]
pub struct StaticItemSource {
    items: Vec<Item>,
    fetches: AtomicUsize,
    fail: AtomicBool,
}

impl StaticItemSource {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Number of `fetch_items` calls, failed ones included
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Make every subsequent fetch fail like an unreachable database
    pub fn fail_fetches(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemSource for StaticItemSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_items(&self) -> Result<ItemCollection> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StashError::source("static source is unavailable"));
        }
        Ok(ItemCollection::new(self.items.clone()))
    }
}
