//! Redis Store Module
//!
//! `KvStore` over a Redis connection manager. Reconnection after transient
//! network loss is handled by the manager with capped exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, ErrorKind, RedisError};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::store::{validate_write, KvStore};

// == Reconnect Settings ==
/// Backoff parameters for the connection manager.
///
/// The delay before retry `n` is `factor_ms * 2^n`, capped at `max_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectSettings {
    pub factor_ms: u64,
    pub max_delay_ms: u64,
    pub retries: usize,
    pub connection_timeout: Duration,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            factor_ms: 50,
            max_delay_ms: 2000,
            retries: 6,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

// == Redis Store ==
/// Redis-backed store. The connection is opened by `connect` and dropped by
/// `close`; calls made outside that window fail as unavailable.
pub struct RedisStore {
    client: redis::Client,
    settings: ReconnectSettings,
    conn: RwLock<Option<ConnectionManager>>,
}

impl RedisStore {
    /// Parses `url` without connecting.
    pub fn open(url: &str, settings: ReconnectSettings) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {}", e)))?;
        Ok(Self {
            client,
            settings,
            conn: RwLock::new(None),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        self.conn
            .read()
            .await
            .clone()
            .ok_or_else(|| StoreError::Unavailable("redis store is not connected".to_string()))
    }
}

fn map_redis_error(key: &str, err: RedisError) -> StoreError {
    if err.kind() == ErrorKind::TypeError {
        StoreError::Malformed {
            key: key.to_string(),
            reason: err.to_string(),
        }
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl KvStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn connect(&self) -> Result<(), StoreError> {
        let mut slot = self.conn.write().await;
        if slot.is_some() {
            return Ok(());
        }

        let config = ConnectionManagerConfig::new()
            .set_exponent_base(2)
            .set_factor(self.settings.factor_ms)
            .set_max_delay(self.settings.max_delay_ms)
            .set_number_of_retries(self.settings.retries)
            .set_connection_timeout(self.settings.connection_timeout);

        let manager = ConnectionManager::new_with_config(self.client.clone(), config)
            .await
            .map_err(|e| {
                warn!(error = %e, "Redis connection failed");
                StoreError::Unavailable(e.to_string())
            })?;

        *slot = Some(manager);
        info!("Redis connection established");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        ttl_secs: u64,
        value: &str,
    ) -> Result<(), StoreError> {
        validate_write(key, ttl_secs, value)?;
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.conn.write().await.take().is_some() {
            info!("Redis connection released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_caps_at_two_seconds() {
        let settings = ReconnectSettings::default();
        assert_eq!(settings.factor_ms, 50);
        assert_eq!(settings.max_delay_ms, 2000);
    }

    #[test]
    fn test_open_rejects_bad_url() {
        let result = RedisStore::open("not a url", ReconnectSettings::default());
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_calls_before_connect_are_unavailable() {
        let store = RedisStore::open("redis://127.0.0.1:6379", ReconnectSettings::default())
            .unwrap();

        let read = store.get("key").await;
        assert!(matches!(read, Err(StoreError::Unavailable(_))));

        let write = store.set_with_expiry("key", 60, "value").await;
        assert!(matches!(write, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_close_without_connect_is_noop() {
        let store = RedisStore::open("redis://127.0.0.1:6379", ReconnectSettings::default())
            .unwrap();
        assert!(store.close().await.is_ok());
        assert_eq!(store.name(), "redis");
    }

    #[test]
    fn test_type_error_maps_to_malformed() {
        let err = RedisError::from((ErrorKind::TypeError, "not a string"));
        assert!(matches!(
            map_redis_error("key", err),
            StoreError::Malformed { .. }
        ));
    }

    #[test]
    fn test_io_error_maps_to_unavailable() {
        let err = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(
            map_redis_error("key", err),
            StoreError::Unavailable(_)
        ));
    }
}
