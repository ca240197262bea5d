use super::{CacheError, ForecastStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Redis-backed store. Keys are the raw location strings, without a prefix.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        tracing::info!("Connected to Redis at {}", url);
        Ok(Self { connection })
    }
}

/// Seconds argument for `SET .. EX`, which rejects 0: sub-second TTLs round up.
fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// Maps a `TTL` reply: -2 means no such key, -1 a key without expiry.
fn remaining_from_reply(reply: i64) -> Option<Duration> {
    match reply {
        -2 => None,
        -1 => Some(Duration::MAX),
        secs => Some(Duration::from_secs(secs.max(0) as u64)),
    }
}

#[async_trait]
impl ForecastStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, expiry_seconds(ttl)).await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let mut conn = self.connection.clone();
        let reply: i64 = conn.ttl(key).await?;
        Ok(remaining_from_reply(reply))
    }
}
