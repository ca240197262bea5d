//! Key-value storage for serialized forecasts.
//!
//! [`ForecastStore`] is the seam the gateway talks to. Two backends exist:
//! - [`RedisStore`] - shared Redis instance, the production default
//! - [`MemoryStore`] - in-process moka cache, for single-node runs and tests

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis command failed: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait ForecastStore: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous entry and its expiry.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Remaining time to live of `key`, `None` when the key is absent.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError>;
}
