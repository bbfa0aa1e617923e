//! SQLite-backed key-value store.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::ports::KeyValueStore;

#[derive(Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO kv_store (key, value, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> DomainResult<Vec<String>> {
        // substr comparison sidesteps LIKE wildcards in user ids.
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT key FROM kv_store WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_store() -> SqliteKeyValueStore {
        SqliteKeyValueStore::new(create_migrated_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_set_get_overwrite_remove() {
        let store = setup_store().await;
        assert!(store.get("a").await.unwrap().is_none());

        store.set("a", "1").await.unwrap();
        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));

        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_prefix_treats_wildcards_literally() {
        let store = setup_store().await;
        store.set("cache:u_1:squat", "x").await.unwrap();
        store.set("cache:u_1:bench", "x").await.unwrap();
        store.set("cache:ux1:squat", "x").await.unwrap();
        store.set("other:u_1:squat", "x").await.unwrap();

        let keys = store.keys_with_prefix("cache:u_1:").await.unwrap();
        assert_eq!(keys, vec!["cache:u_1:bench".to_string(), "cache:u_1:squat".to_string()]);
    }
}
