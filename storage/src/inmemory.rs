//! In-memory property store, used in tests and when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::property::{PropertyStore, PropertyValue, Scope};

#[derive(Debug, Default)]
pub struct InMemoryPropertyStore {
    inner: RwLock<HashMap<(Scope, String), PropertyValue>>,
}

impl InMemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored properties across all scopes.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl PropertyStore for InMemoryPropertyStore {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<PropertyValue>, StorageError> {
        let map = self.inner.read().await;
        Ok(map.get(&(scope, key.to_string())).cloned())
    }

    async fn set(&self, scope: Scope, key: &str, value: PropertyValue) -> Result<(), StorageError> {
        let mut map = self.inner.write().await;
        map.insert((scope, key.to_string()), value);
        Ok(())
    }
}
