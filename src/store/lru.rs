//! LRU Tracker Module
//!
//! Access-order bookkeeping for capacity eviction in the in-process store.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks key recency with a monotonically increasing access counter.
///
/// `by_key` maps a key to its last access tick and `by_tick` orders ticks,
/// so touch, remove and evict are all O(log n).
#[derive(Debug, Default)]
pub struct LruTracker {
    tick: u64,
    by_key: HashMap<String, u64>,
    by_tick: BTreeMap<u64, String>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, tracking it if new.
    pub fn touch(&mut self, key: &str) {
        self.tick += 1;
        if let Some(previous) = self.by_key.insert(key.to_string(), self.tick) {
            self.by_tick.remove(&previous);
        }
        self.by_tick.insert(self.tick, key.to_string());
    }

    // == Remove ==
    /// Stops tracking a key.
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.by_key.remove(key) {
            self.by_tick.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_tick.pop_first()?;
        self.by_key.remove(&key);
        Some(key)
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
