//! Store Entry Module
//!
//! A single stored value with its absolute expiry time.

// == Store Entry ==
/// A stored value plus its deadline (Unix milliseconds).
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The stored value
    pub value: String,
    /// When the entry stops being readable
    pub expires_at: u64,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates an entry written at `now_ms` that lives for `ttl_secs`.
    pub fn new(value: String, ttl_secs: u64, now_ms: u64) -> Self {
        Self {
            value,
            expires_at: now_ms.saturating_add(ttl_secs.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now_ms` reaches `expires_at`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}
