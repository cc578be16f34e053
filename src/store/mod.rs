//! Key-value persistence for plugin state.
//!
//! The bot host owns persistence; the plugin only sees a mapping from string
//! key to JSON value. Every collection the plugin keeps (queues, assignment
//! table, scoreboard, corpus) is read as a whole, modified locally and written
//! back under the same key.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-lifetime map, used by tests and the default CLI.
//! - [`SqliteStore`]: single-table SQLite file.
//! - [`RedisStore`]: one Redis string per key.

pub mod memory;
pub mod redis;
pub mod sqlite;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;
pub use self::sqlite::SqliteStore;

/// Host-provided persistence interface.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if it was never set.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces the value stored under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Returns true if `key` has been set.
    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Reads and decodes the value under `key`, falling back to `T::default()`.
pub async fn load<T>(store: &dyn KeyValueStore, key: &str) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(Value::Null) | None => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        }),
    }
}

/// Encodes `value` and writes it under `key`.
pub async fn save<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
{
    let encoded = serde_json::to_value(value)?;
    store.set(key, encoded).await
}
