//! Query Cache Facade
//!
//! Wraps a computation with a read-through lookup in the key-value store.
//! Store faults never reach the caller: the facade degrades to computing
//! directly.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info};

use crate::cache::{QueryCacheCounters, QueryCacheStats, DEFAULT_TTL_SECS};
use crate::store::{KvStore, SharedStore};

// == Query Cache ==
/// Compute-or-fetch facade. Cheap to clone; clones share store and counters.
///
/// There is no single-flight coordination: concurrent misses on one key each
/// run their computation and each write the result.
#[derive(Clone)]
pub struct QueryCache {
    store: SharedStore,
    default_ttl: u64,
    counters: Arc<QueryCacheCounters>,
}

impl QueryCache {
    /// Creates a facade over `store` with the standard one hour TTL.
    pub fn new(store: SharedStore) -> Self {
        Self::with_default_ttl(store, DEFAULT_TTL_SECS)
    }

    pub fn with_default_ttl(store: SharedStore, default_ttl: u64) -> Self {
        Self {
            store,
            default_ttl: default_ttl.max(1),
            counters: Arc::new(QueryCacheCounters::default()),
        }
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub fn stats(&self) -> QueryCacheStats {
        self.counters.snapshot()
    }

    /// `cache_query_with_ttl` using the default TTL.
    pub async fn cache_query<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        self.cache_query_with_ttl(key, self.default_ttl, compute).await
    }

    // == Cache Query ==
    /// Returns the cached value for `key`, or runs `compute` and caches what
    /// it yields for `ttl_secs` seconds.
    ///
    /// `Ok(None)` from `compute` is returned as-is and not written. Errors
    /// from `compute` are propagated unchanged. Store and codec failures are
    /// logged and answered by calling `compute` directly; `compute` runs at
    /// most once per call.
    pub async fn cache_query_with_ttl<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_secs: u64,
        compute: F,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    info!(key = %key, "Cache hit");
                    self.counters.record_hit();
                    return Ok(Some(value));
                }
                Err(e) => {
                    error!(key = %key, error = %e, "Undecodable cache entry, computing directly");
                    self.counters.record_store_error();
                    return compute().await;
                }
            },
            Ok(None) => {
                info!(key = %key, "Cache miss");
                self.counters.record_miss();
            }
            Err(e) => {
                error!(key = %key, error = %e, "Cache read failed, computing directly");
                self.counters.record_store_error();
                return compute().await;
            }
        }

        let value = compute().await?;
        if let Some(value) = &value {
            self.write_back(key, ttl_secs, value).await;
        }
        Ok(value)
    }

    async fn write_back<T: Serialize>(&self, key: &str, ttl_secs: u64, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(key = %key, error = %e, "Cache value not serializable, skipping write");
                self.counters.record_store_error();
                return;
            }
        };

        match self.store.set_with_expiry(key, ttl_secs, &encoded).await {
            Ok(()) => {
                debug!(key = %key, ttl_secs, "Cache write");
                self.counters.record_write();
            }
            Err(e) => {
                error!(key = %key, error = %e, "Cache write failed");
                self.counters.record_store_error();
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::UnavailableStore;
    use crate::store::{KvStore, ManualClock, MemoryStore};
    use serde::Deserialize;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Barrier;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Campaign {
        id: u32,
        name: String,
    }

    fn campaign(id: u32) -> Campaign {
        Campaign {
            id,
            name: format!("campaign-{}", id),
        }
    }

    fn memory_cache() -> (QueryCache, MemoryStore, ManualClock) {
        let clock = ManualClock::new(0);
        let store = MemoryStore::with_clock(100, Arc::new(clock.clone()));
        let cache = QueryCache::new(Arc::new(store.clone()));
        (cache, store, clock)
    }

    #[tokio::test]
    async fn test_cold_call_computes_once_then_hits() {
        let (cache, _store, _clock) = memory_cache();
        let calls = AtomicUsize::new(0);

        let first = cache
            .cache_query("campaigns:1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(Some(campaign(1)))
            })
            .await
            .unwrap();
        assert_eq!(first, Some(campaign(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = cache
            .cache_query("campaigns:1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(Some(campaign(2)))
            })
            .await
            .unwrap();
        assert_eq!(second, Some(campaign(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputes() {
        let (cache, _store, clock) = memory_cache();

        cache
            .cache_query_with_ttl("campaigns", 5, || async {
                Ok::<_, Infallible>(Some(campaign(1)))
            })
            .await
            .unwrap();

        clock.advance(Duration::from_secs(6));

        let value = cache
            .cache_query_with_ttl("campaigns", 5, || async {
                Ok::<_, Infallible>(Some(campaign(2)))
            })
            .await
            .unwrap();
        assert_eq!(value, Some(campaign(2)));
    }

    #[tokio::test]
    async fn test_empty_result_is_not_written() {
        let (cache, store, _clock) = memory_cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .cache_query("referrals:none", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<Option<Campaign>, Infallible>(None)
                })
                .await
                .unwrap();
            assert_eq!(value, None);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_compute_error_propagates_and_is_not_cached() {
        let (cache, store, _clock) = memory_cache();

        let result = cache
            .cache_query::<Campaign, _, _, _>("campaigns:err", || async {
                Err("database offline")
            })
            .await;

        assert_eq!(result, Err("database offline"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unreachable_store_degrades_to_compute() {
        let cache = QueryCache::new(Arc::new(UnavailableStore));
        let calls = AtomicUsize::new(0);

        let value = cache
            .cache_query("campaigns:1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(Some(campaign(1)))
            })
            .await
            .unwrap();

        assert_eq!(value, Some(campaign(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().store_errors, 1);
    }

    #[tokio::test]
    async fn test_unreachable_store_still_propagates_compute_error() {
        let cache = QueryCache::new(Arc::new(UnavailableStore));

        let result = cache
            .cache_query::<Campaign, _, _, _>("campaigns:1", || async { Err("boom") })
            .await;

        assert_eq!(result, Err("boom"));
    }

    #[tokio::test]
    async fn test_malformed_entry_degrades_to_compute() {
        let (cache, store, _clock) = memory_cache();
        store
            .set_with_expiry("campaigns:1", 60, "{not json")
            .await
            .unwrap();

        let value = cache
            .cache_query("campaigns:1", || async {
                Ok::<_, Infallible>(Some(campaign(7)))
            })
            .await
            .unwrap();

        assert_eq!(value, Some(campaign(7)));
        assert_eq!(cache.stats().store_errors, 1);
        // The bad entry is left for the store to expire
        assert_eq!(
            store.get("campaigns:1").await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn test_rejected_write_still_returns_value() {
        let (cache, store, _clock) = memory_cache();
        let key = "k".repeat(crate::store::MAX_KEY_LENGTH + 1);

        let value = cache
            .cache_query(&key, || async { Ok::<_, Infallible>(Some(campaign(3))) })
            .await
            .unwrap();

        assert_eq!(value, Some(campaign(3)));
        assert!(store.is_empty().await);
        assert_eq!(cache.stats().store_errors, 1);
    }

    // Stampede is tolerated: both concurrent misses compute and write.
    #[tokio::test]
    async fn test_concurrent_misses_each_compute() {
        let (cache, store, _clock) = memory_cache();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(2);

        let calls_ref = &calls;
        let barrier_ref = &barrier;

        let (a, b) = tokio::join!(
            cache.cache_query("campaigns:hot", move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                barrier_ref.wait().await;
                Ok::<_, Infallible>(Some(campaign(1)))
            }),
            cache.cache_query("campaigns:hot", move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                barrier_ref.wait().await;
                Ok::<_, Infallible>(Some(campaign(2)))
            }),
        );

        assert_eq!(a.unwrap(), Some(campaign(1)));
        assert_eq!(b.unwrap(), Some(campaign(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().writes, 2);
        assert_eq!(store.len().await, 1);
    }
}
