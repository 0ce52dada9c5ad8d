//! Store doubles for unit tests.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::KvStore;

/// Store whose every call fails as if the server were down.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

#[async_trait]
impl KvStore for UnavailableStore {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn connect(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set_with_expiry(
        &self,
        _key: &str,
        _ttl_secs: u64,
        _value: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}
