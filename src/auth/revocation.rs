//! Revocation Guard
//!
//! Denylist of invalidated tokens kept in the shared key-value store. Each
//! record lives at `blacklist:<sha256 hex>` and expires with its TTL.
//!
//! Lookups fail closed: if the store cannot answer, the request is rejected.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::auth::{parse_bearer, token_digest};
use crate::cache::DEFAULT_TTL_SECS;
use crate::error::{AuthError, StoreError};
use crate::store::{KvStore, SharedStore};

/// Key namespace for revocation records.
pub const BLACKLIST_PREFIX: &str = "blacklist:";

/// Value stored for a revoked token. Only presence matters.
pub const REVOKED_MARKER: &str = "1";

/// Store key for a raw token. The token itself never appears in the key.
pub fn revocation_key(token: &str) -> String {
    format!("{}{}", BLACKLIST_PREFIX, token_digest(token))
}

#[derive(Debug, Default)]
pub struct GuardCounters {
    revocations: AtomicU64,
    rejected: AtomicU64,
    store_faults: AtomicU64,
}

impl GuardCounters {
    pub fn snapshot(&self) -> GuardStats {
        GuardStats {
            revocations: self.revocations.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            store_faults: self.store_faults.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the guard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardStats {
    /// Tokens successfully added to the denylist
    pub revocations: u64,
    /// Requests refused because their token was revoked
    pub rejected: u64,
    /// Revocation writes or lookups the store could not serve
    pub store_faults: u64,
}

// == Revocation Guard ==
#[derive(Clone)]
pub struct RevocationGuard {
    store: SharedStore,
    default_ttl: u64,
    counters: Arc<GuardCounters>,
}

impl RevocationGuard {
    pub fn new(store: SharedStore) -> Self {
        Self::with_default_ttl(store, DEFAULT_TTL_SECS)
    }

    pub fn with_default_ttl(store: SharedStore, default_ttl: u64) -> Self {
        Self {
            store,
            default_ttl: default_ttl.max(1),
            counters: Arc::new(GuardCounters::default()),
        }
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub fn stats(&self) -> GuardStats {
        self.counters.snapshot()
    }

    /// Revokes `token` for the default TTL.
    pub async fn blacklist_token(&self, token: &str) -> Result<(), StoreError> {
        self.blacklist_token_with_ttl(token, self.default_ttl).await
    }

    // == Blacklist Token ==
    /// Revokes `token` for `ttl_secs` seconds.
    ///
    /// Once this returns `Ok`, every check for the same token is rejected
    /// until the record expires. Repeating the call refreshes the TTL. A
    /// failed write leaves the token usable, so the error is returned for the
    /// caller to retry or report.
    pub async fn blacklist_token_with_ttl(
        &self,
        token: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let key = revocation_key(token);
        match self.store.set_with_expiry(&key, ttl_secs, REVOKED_MARKER).await {
            Ok(()) => {
                info!(key = %key, ttl_secs, "Token blacklisted");
                self.counters.revocations.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                error!(key = %key, error = %e, "Error blacklisting token");
                self.counters.store_faults.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Whether a revocation record exists for `token`.
    pub async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        let key = revocation_key(token);
        Ok(self.store.get(&key).await?.is_some())
    }

    // == Check Blacklist ==
    /// Gate for an inbound `Authorization` header value.
    ///
    /// Returns the bearer token when the request may proceed. Rejects a
    /// missing or malformed header, a revoked token, and any lookup the store
    /// fails to answer.
    pub async fn check_blacklist<'a>(
        &self,
        authorization: Option<&'a str>,
    ) -> Result<&'a str, AuthError> {
        let token = parse_bearer(authorization)?;
        self.ensure_not_revoked(token).await?;
        Ok(token)
    }

    /// Revocation lookup for an already-parsed bearer token.
    pub async fn ensure_not_revoked(&self, token: &str) -> Result<(), AuthError> {
        match self.is_revoked(token).await {
            Ok(false) => Ok(()),
            Ok(true) => {
                warn!(key = %revocation_key(token), "Rejected blacklisted token");
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                Err(AuthError::Revoked)
            }
            Err(e) => {
                error!(error = %e, "JWT blacklist lookup failed");
                self.counters.store_faults.fetch_add(1, Ordering::Relaxed);
                Err(AuthError::StoreFault(e))
            }
        }
    }
}
