//! Redis-backed key-value store.
//!
//! Each plugin key is stored as a JSON string under `{prefix}:{key}` so that
//! several plugin instances can share one Redis database.

use async_trait::async_trait;
use ::redis::aio::ConnectionManager;
use ::redis::AsyncCommands;
use serde_json::Value;

use super::KeyValueStore;
use crate::error::StoreError;

/// Default key prefix.
pub const DEFAULT_PREFIX: &str = "social_support";

/// Key-value store backed by Redis strings.
#[derive(Clone)]
pub struct RedisStore {
    /// Redis connection manager (handles reconnection automatically).
    redis: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Connects to Redis at `redis_url` (e.g. "redis://localhost:6379").
    pub async fn connect(redis_url: &str, prefix: &str) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(redis_url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let redis = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        tracing::info!(prefix = prefix, "Connected to Redis plugin store");
        Ok(Self::from_connection(redis, prefix))
    }

    /// Creates a store from an existing `ConnectionManager`.
    pub fn from_connection(redis: ConnectionManager, prefix: &str) -> Self {
        Self {
            redis,
            prefix: prefix.to_string(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        namespaced_key(&self.prefix, key)
    }
}

fn namespaced_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", prefix, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(self.namespaced(key)).await?;

        raw.map(|data| {
            serde_json::from_str(&data).map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&value)?;
        let mut conn = self.redis.clone();
        conn.set::<_, _, ()>(self.namespaced(key), encoded).await?;
        Ok(())
    }
}
