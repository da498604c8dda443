//! SQLite-backed property store.
//!
//! Table `properties` keyed by `(scope, key)`; `set` upserts so the last write wins.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::property::{PropertyStore, PropertyValue, Scope};
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct SqlitePropertyStore {
    pool_manager: SqlitePoolManager,
}

impl SqlitePropertyStore {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let store = Self { pool_manager };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        info!("Creating properties table if not exist");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS properties (
                scope TEXT NOT NULL,
                key TEXT NOT NULL,
                value_type TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (scope, key)
            )
            "#,
        )
        .execute(self.pool_manager.pool())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PropertyStore for SqlitePropertyStore {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<PropertyValue>, StorageError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT value_type, value FROM properties WHERE scope = ? AND key = ?")
                .bind(scope.to_string())
                .bind(key)
                .fetch_optional(self.pool_manager.pool())
                .await?;

        row.map(|(value_type, value)| PropertyValue::decode(&value_type, &value))
            .transpose()
    }

    async fn set(&self, scope: Scope, key: &str, value: PropertyValue) -> Result<(), StorageError> {
        let encoded = value.encode()?;

        sqlx::query(
            r#"
            INSERT INTO properties (scope, key, value_type, value, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(scope, key) DO UPDATE SET
                value_type = excluded.value_type,
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(scope.to_string())
        .bind(key)
        .bind(value.type_hint())
        .bind(&encoded)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;

        debug!(scope = %scope, key = %key, value_type = value.type_hint(), "Saved property");
        Ok(())
    }
}
