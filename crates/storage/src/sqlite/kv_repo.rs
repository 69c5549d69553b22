use async_trait::async_trait;
use serde_json::Value;
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{KeyValueStore, StorageError, StoreScope, check_key};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl KeyValueStore for SqliteRepository {
    async fn get(&self, scope: &StoreScope, key: &str) -> Result<Option<Value>, StorageError> {
        check_key(key)?;
        let row = sqlx::query("SELECT value FROM kv_entries WHERE scope = ?1 AND key = ?2")
            .bind(scope.as_str())
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("value").map_err(ser)?;
        serde_json::from_str(&raw).map(Some).map_err(ser)
    }

    async fn set(&self, scope: &StoreScope, key: &str, value: &Value) -> Result<(), StorageError> {
        check_key(key)?;
        let raw = serde_json::to_string(value).map_err(ser)?;
        sqlx::query(
            r"
            INSERT INTO kv_entries (scope, key, value, updated_at)
            VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
            ON CONFLICT(scope, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(scope.as_str())
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn clear(&self, scope: &StoreScope) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM kv_entries WHERE scope = ?1")
            .bind(scope.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected())
    }
}
