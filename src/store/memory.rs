//! In-Process Store Module
//!
//! HashMap-backed store with TTL expiry and LRU capacity eviction.
//!
//! Revocation records (`blacklist:*`) are never evicted. They only leave the
//! store when their TTL elapses, so a full store rejects further writes
//! instead of dropping one.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::BLACKLIST_PREFIX;
use crate::error::StoreError;
use crate::store::{
    validate_write, Clock, KvStore, LruTracker, StoreEntry, StoreStats, SystemClock,
};

/// Keys under this prefix are exempt from capacity eviction.
fn is_pinned(key: &str) -> bool {
    key.starts_with(BLACKLIST_PREFIX)
}

#[derive(Debug)]
struct MemoryInner {
    entries: HashMap<String, StoreEntry>,
    /// Recency of evictable keys only
    lru: LruTracker,
    stats: StoreStats,
    max_entries: usize,
}

impl MemoryInner {
    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.lru.remove(key);
    }

    fn touch(&mut self, key: &str) {
        if !is_pinned(key) {
            self.lru.touch(key);
        }
    }

    /// Drops every entry expired at `now_ms` and returns how many went.
    fn purge_expired(&mut self, now_ms: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }

        self.stats.record_expirations(expired.len());
        let remaining = self.entries.len();
        self.stats.set_total_entries(remaining);
        expired.len()
    }

    /// Frees one slot: expired entries first, then the least recently used
    /// evictable key.
    fn make_room(&mut self, now_ms: u64) -> Result<(), StoreError> {
        if self.purge_expired(now_ms) > 0 {
            return Ok(());
        }

        match self.lru.evict_oldest() {
            Some(evicted) => {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                Ok(())
            }
            None => Err(StoreError::Unavailable(
                "store is full of revocation records".to_string(),
            )),
        }
    }
}

// == Memory Store ==
/// In-process key-value store. Clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` live keys.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    /// Creates a store that reads time from `clock`.
    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryInner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: StoreStats::new(),
                max_entries: max_entries.max(1),
            })),
            clock,
        }
    }

    // == Stats ==
    /// Returns a snapshot of the store counters.
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    // == Cleanup Expired ==
    /// Removes every expired entry and returns how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_ms();
        self.inner.write().await.purge_expired(now)
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now_ms();
        // Write lock: reads update recency and counters.
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                inner.stats.record_hit();
                if !is_pinned(key) {
                    inner.lru.touch(key);
                }
                return Ok(Some(value));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.remove(key);
            inner.stats.record_expirations(1);
            let remaining = inner.entries.len();
            inner.stats.set_total_entries(remaining);
        }
        inner.stats.record_miss();
        Ok(None)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        ttl_secs: u64,
        value: &str,
    ) -> Result<(), StoreError> {
        validate_write(key, ttl_secs, value)?;

        let now = self.clock.now_ms();
        let mut inner = self.inner.write().await;

        let is_overwrite = inner.entries.contains_key(key);
        if !is_overwrite && inner.entries.len() >= inner.max_entries {
            inner.make_room(now)?;
        }

        inner
            .entries
            .insert(key.to_string(), StoreEntry::new(value.to_string(), ttl_secs, now));
        inner.touch(key);
        let total = inner.entries.len();
        inner.stats.set_total_entries(total);
        Ok(())
    }
}
