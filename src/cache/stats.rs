//! Query Cache Statistics
//!
//! Lock-free counters for the cache facade.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live counters shared by every clone of a `QueryCache`.
#[derive(Debug, Default)]
pub struct QueryCacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    store_errors: AtomicU64,
}

impl QueryCacheCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QueryCacheStats {
        QueryCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }
}

// == Query Cache Stats ==
/// Point-in-time view of the facade counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCacheStats {
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups that had to compute
    pub misses: u64,
    /// Computed values written back
    pub writes: u64,
    /// Reads, writes or decodes that fell back to direct computation
    pub store_errors: u64,
}

impl QueryCacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
