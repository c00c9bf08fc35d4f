//! # Key-Value Repository
//!
//! `put(key, value)` / `get(key)` over the `local_store` table.
//!
//! Every key is namespaced as `medflow_<key>` and every value is stored as
//! JSON text. There is no schema versioning of values: a value that no
//! longer deserializes into the requested type reads back as absent.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Prefix applied to every key.
pub const KEY_NAMESPACE: &str = "medflow_";

/// Returns the stored form of `key`.
pub fn namespaced(key: &str) -> String {
    format!("{}{}", KEY_NAMESPACE, key)
}

const UPSERT_SQL: &str = r#"
    INSERT INTO local_store (key, value, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

/// A value already serialized for its namespaced key.
#[derive(Debug, Clone)]
pub struct Entry {
    key: String,
    json: String,
}

impl Entry {
    pub fn new<T>(key: &str, value: &T) -> StoreResult<Self>
    where
        T: Serialize + ?Sized,
    {
        let key = namespaced(key);
        let json = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
            key: key.clone(),
            message: e.to_string(),
        })?;
        Ok(Entry { key, json })
    }

    fn upsert(&self) -> Query<'static, Sqlite, SqliteArguments<'static>> {
        sqlx::query(UPSERT_SQL)
            .bind(self.key.clone())
            .bind(self.json.clone())
            .bind(Utc::now().to_rfc3339())
    }
}

#[derive(Debug, Clone)]
pub struct KeyValueRepository {
    pool: SqlitePool,
}

impl KeyValueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        KeyValueRepository { pool }
    }

    /// Serializes `value` and writes it under `key`, replacing any old value.
    pub async fn put<T>(&self, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        let entry = Entry::new(key, value)?;
        entry.upsert().execute(&self.pool).await.map_err(|e| {
            warn!(key = %entry.key, error = %e, "Local store write failed");
            StoreError::from(e)
        })?;

        debug!(key = %entry.key, bytes = entry.json.len(), "Stored value");
        Ok(())
    }

    /// Writes every entry in one transaction. Either all land or none do.
    pub async fn put_all(&self, entries: &[Entry]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            entry.upsert().execute(&mut *tx).await.map_err(|e| {
                warn!(key = %entry.key, error = %e, "Local store write failed, rolling back");
                StoreError::from(e)
            })?;
        }

        tx.commit().await?;
        debug!(count = entries.len(), "Stored values");
        Ok(())
    }

    /// Reads and deserializes the value under `key`.
    ///
    /// Missing keys, read failures and undecodable values all yield `None`.
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key = %namespaced(key), error = %e, "Stored value did not decode");
                None
            }
        }
    }

    /// Returns the stored JSON text under `key`, if any.
    pub async fn get_raw(&self, key: &str) -> Option<String> {
        let stored_key = namespaced(key);
        let result: Result<Option<String>, sqlx::Error> =
            sqlx::query_scalar("SELECT value FROM local_store WHERE key = ?")
                .bind(&stored_key)
                .fetch_optional(&self.pool)
                .await;

        match result {
            Ok(value) => value,
            Err(e) => {
                debug!(key = %stored_key, error = %e, "Local store read failed");
                None
            }
        }
    }

    /// Deletes `key`. Returns true if a value was present.
    pub async fn remove(&self, key: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM local_store WHERE key = ?")
            .bind(namespaced(key))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lists stored keys (namespaced form), sorted.
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        let keys = sqlx::query_scalar("SELECT key FROM local_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::Entry;
    use crate::{LocalStore, StoreConfig};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    async fn store() -> LocalStore {
        LocalStore::open(StoreConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_get_namespaced() {
        let store = store().await;
        let kv = store.kv();

        let sample = Sample { name: "x".into(), count: 3 };
        kv.put("sample", &sample).await.unwrap();

        assert_eq!(kv.get::<Sample>("sample").await, Some(sample));
        assert_eq!(kv.keys().await.unwrap(), vec!["medflow_sample".to_string()]);
        assert_eq!(kv.get_raw("sample").await.as_deref(), Some(r#"{"name":"x","count":3}"#));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = store().await;
        let kv = store.kv();

        kv.put("n", &1).await.unwrap();
        kv.put("n", &2).await.unwrap();
        assert_eq!(kv.get::<i32>("n").await, Some(2));
        assert_eq!(kv.keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_and_undecodable_read_as_absent() {
        let store = store().await;
        let kv = store.kv();

        assert_eq!(kv.get::<Sample>("nothing").await, None);

        kv.put("sample", &"just a string").await.unwrap();
        assert_eq!(kv.get::<Sample>("sample").await, None);

        // null is stored, but reads back as absent for a struct
        kv.put("sample", &Option::<Sample>::None).await.unwrap();
        assert_eq!(kv.get::<Sample>("sample").await, None);
    }

    #[tokio::test]
    async fn test_put_all() {
        let store = store().await;
        let kv = store.kv();

        kv.put("a", &1).await.unwrap();
        let entries = [Entry::new("a", &2).unwrap(), Entry::new("b", &"two").unwrap()];
        kv.put_all(&entries).await.unwrap();

        assert_eq!(kv.get::<i32>("a").await, Some(2));
        assert_eq!(kv.get::<String>("b").await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store().await;
        let kv = store.kv();

        kv.put("k", &true).await.unwrap();
        assert!(kv.remove("k").await.unwrap());
        assert!(!kv.remove("k").await.unwrap());
        assert_eq!(kv.get::<bool>("k").await, None);
    }
}
