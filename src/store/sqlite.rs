//! SQLite-backed key-value store.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::KeyValueStore;
use crate::error::StoreError;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS plugin_kv (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Key-value store persisted in a single SQLite table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;

        sqlx::query(SCHEMA_SQL).execute(&pool).await?;

        tracing::info!(path = path, "Plugin store opened");
        Ok(Self { pool })
    }

    /// Lists every key currently stored, sorted.
    pub async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT key FROM plugin_kv ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("key")).collect())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT value FROM plugin_kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("value");
                let value = serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&value)?;
        sqlx::query(
            "INSERT INTO plugin_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')",
        )
        .bind(key)
        .bind(encoded)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn open_temp() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plugin.db");
        let store = SqliteStore::open(path.to_str().expect("utf-8 path"))
            .await
            .expect("open store");
        (dir, store)
    }

    #[tokio::test]
    async fn test_roundtrip_and_upsert() {
        let (_dir, store) = open_temp().await;

        assert!(store.get("TRAINER_SCOREBOARD").await.expect("get").is_none());

        store
            .set("TRAINER_SCOREBOARD", json!([{"trainer": "One", "score": 1}]))
            .await
            .expect("set");
        store
            .set("TRAINER_SCOREBOARD", json!([{"trainer": "One", "score": 2}]))
            .await
            .expect("set");

        let value = store.get("TRAINER_SCOREBOARD").await.expect("get");
        assert_eq!(value, Some(json!([{"trainer": "One", "score": 2}])));
        assert_eq!(store.keys().await.expect("keys"), vec!["TRAINER_SCOREBOARD"]);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plugin.db");
        let path = path.to_str().expect("utf-8 path");

        {
            let store = SqliteStore::open(path).await.expect("open");
            store.set("SUPPORT_TRAINING_CORPUS", json!([])).await.expect("set");
        }

        let store = SqliteStore::open(path).await.expect("reopen");
        assert!(store.contains("SUPPORT_TRAINING_CORPUS").await.expect("contains"));
    }
}
