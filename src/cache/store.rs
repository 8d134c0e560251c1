use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Expiring key/value store holding JSON values.
///
/// The store is best-effort: callers treat an error exactly like a miss
/// and never fail a request because of it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns `None` when the key is absent or its entry has expired
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Insert or overwrite, resetting expiry. `None` uses the store's default TTL.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()>;

    /// Removing an absent key is not an error
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Each key is deleted independently; order does not matter. A failure on
    /// one key does not stop the others, the first error is reported.
    async fn delete_all(&self, keys: &[String]) -> CacheResult<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(e) = self.delete(key).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn flush(&self) -> CacheResult<()>;
}
