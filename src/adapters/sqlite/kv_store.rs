//! SQLite-backed `KvStore` (spec §6). Reference implementation of the
//! collaborator-facing durable namespaced KV contract, for deployments that
//! don't wire up an external KV service.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::domain::ports::collaborators::{CollaboratorError, CollaboratorResult, KvStore};

#[derive(Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, namespace: &str, key: &str) -> CollaboratorResult<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE namespace = ? AND key = ?")
            .bind(namespace)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CollaboratorError::NetworkError(e.to_string()))?;
        Ok(row.map(|r| r.get::<Vec<u8>, _>("value")))
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> CollaboratorResult<()> {
        sqlx::query(
            "INSERT INTO kv_store (namespace, key, value) VALUES (?, ?, ?)
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value",
        )
        .bind(namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| CollaboratorError::NetworkError(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> CollaboratorResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE namespace = ? AND key = ?")
            .bind(namespace)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| CollaboratorError::NetworkError(e.to_string()))?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        namespace: &str,
        key: &str,
        expected: Option<Vec<u8>>,
        new: Vec<u8>,
    ) -> CollaboratorResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CollaboratorError::NetworkError(e.to_string()))?;

        let current = sqlx::query("SELECT value FROM kv_store WHERE namespace = ? AND key = ?")
            .bind(namespace)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| CollaboratorError::NetworkError(e.to_string()))?
            .map(|r| r.get::<Vec<u8>, _>("value"));

        if current != expected {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO kv_store (namespace, key, value) VALUES (?, ?, ?)
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value",
        )
        .bind(namespace)
        .bind(key)
        .bind(new)
        .execute(&mut *tx)
        .await
        .map_err(|e| CollaboratorError::NetworkError(e.to_string()))?;

        tx.commit().await.map_err(|e| CollaboratorError::NetworkError(e.to_string()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{all_embedded_migrations, create_test_pool, Migrator};

    async fn store() -> SqliteKvStore {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();
        SqliteKvStore::new(pool)
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = store().await;
        store.set("ns", "k1", b"v1".to_vec()).await.unwrap();
        assert_eq!(store.get("ns", "k1").await.unwrap(), Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn compare_and_swap_fails_on_mismatch() {
        let store = store().await;
        store.set("ns", "k1", b"v1".to_vec()).await.unwrap();

        let applied = store
            .compare_and_swap("ns", "k1", Some(b"wrong".to_vec()), b"v2".to_vec())
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(store.get("ns", "k1").await.unwrap(), Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn compare_and_swap_applies_on_match() {
        let store = store().await;
        store.set("ns", "k1", b"v1".to_vec()).await.unwrap();

        let applied = store
            .compare_and_swap("ns", "k1", Some(b"v1".to_vec()), b"v2".to_vec())
            .await
            .unwrap();
        assert!(applied);
        assert_eq!(store.get("ns", "k1").await.unwrap(), Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn compare_and_swap_requires_absence_when_expected_none() {
        let store = store().await;
        let applied = store
            .compare_and_swap("ns", "new-key", None, b"v1".to_vec())
            .await
            .unwrap();
        assert!(applied);
    }
}
