//! Store Module
//!
//! Minimal client abstraction over the external key-value store, with an
//! in-process TTL backend and a Redis backend.

mod clock;
mod entry;
mod lru;
mod memory;
mod redis_store;
mod stats;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::StoreEntry;
pub use lru::LruTracker;
pub use memory::MemoryStore;
pub use redis_store::{ReconnectSettings, RedisStore};
pub use stats::StoreStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Key-Value Store ==
/// Capability set required from a key-value store client.
///
/// Every call is a suspension point. Implementations own their own
/// reconnection policy; callers never retry.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name used in logs and health output.
    fn name(&self) -> &'static str;

    /// Establishes the connection. Called once at startup.
    async fn connect(&self) -> Result<(), StoreError>;

    /// Reads a value. Absent and expired keys both yield `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a value that expires after `ttl_secs` seconds, replacing any
    /// previous value under the same key.
    async fn set_with_expiry(&self, key: &str, ttl_secs: u64, value: &str)
        -> Result<(), StoreError>;

    /// Releases the connection on shutdown.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store handle shared by the cache facade and the revocation guard.
pub type SharedStore = Arc<dyn KvStore>;

/// Rejects writes the store would refuse anyway.
pub(crate) fn validate_write(key: &str, ttl_secs: u64, value: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StoreError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if value.len() > MAX_VALUE_SIZE {
        return Err(StoreError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    if ttl_secs == 0 {
        return Err(StoreError::InvalidRequest(
            "TTL must be at least one second".to_string(),
        ));
    }
    Ok(())
}
