//! Cache Module
//!
//! Compute-or-fetch facade over the shared key-value store.

mod query;
mod stats;

pub use query::QueryCache;
pub use stats::{QueryCacheCounters, QueryCacheStats};

/// TTL applied when the caller does not pass one.
pub const DEFAULT_TTL_SECS: u64 = 3600;
