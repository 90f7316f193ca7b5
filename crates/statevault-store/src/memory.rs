// ABOUTME: In-memory storage driver keeping namespaces in a shared map.
// ABOUTME: Used for tests and for ephemeral sessions that never touch disk.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::driver::{Namespace, StorageDriver};
use crate::error::StoreError;

type Spaces = Arc<RwLock<HashMap<(String, String), HashMap<String, String>>>>;

/// Storage driver backed by process memory. Clones share the same spaces,
/// so one driver handed to multiple stores behaves like one storage medium.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    spaces: Spaces,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageDriver for MemoryDriver {
    async fn open(
        &self,
        application: &str,
        namespace: &str,
    ) -> Result<Arc<dyn Namespace>, StoreError> {
        let scope = (application.to_string(), namespace.to_string());
        self.spaces.write().await.entry(scope.clone()).or_default();
        Ok(Arc::new(MemoryNamespace {
            spaces: Arc::clone(&self.spaces),
            scope,
        }))
    }

    async fn drop_namespace(&self, application: &str, namespace: &str) -> Result<(), StoreError> {
        let scope = (application.to_string(), namespace.to_string());
        self.spaces.write().await.remove(&scope);
        Ok(())
    }
}

struct MemoryNamespace {
    spaces: Spaces,
    scope: (String, String),
}

#[async_trait]
impl Namespace for MemoryNamespace {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let spaces = self.spaces.read().await;
        Ok(spaces
            .get(&self.scope)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut spaces = self.spaces.write().await;
        spaces
            .entry(self.scope.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut spaces = self.spaces.write().await;
        if let Some(entries) = spaces.get_mut(&self.scope) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let spaces = self.spaces.read().await;
        Ok(spaces
            .get(&self.scope)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }
}
