// ABOUTME: Storage driver traits: isolated named namespaces with key-value operations.
// ABOUTME: Defines the capability set the versioned store requires from durable storage.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;

/// A durable key-value namespace scoped by (application name, namespace name).
///
/// Values are opaque serialized strings; the namespace stores and lists them
/// without interpreting their content.
#[async_trait]
pub trait Namespace: Send + Sync {
    /// Read one entry, or None if the key is absent.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write one entry, creating or overwriting it.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete one entry. Deleting an absent key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// List every key currently present in the namespace.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Constructs and destroys isolated namespaces for one storage medium.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Open the namespace, creating it if it does not exist.
    async fn open(
        &self,
        application: &str,
        namespace: &str,
    ) -> Result<Arc<dyn Namespace>, StoreError>;

    /// Irrevocably delete a namespace and all of its entries.
    /// Dropping an absent namespace is not an error.
    async fn drop_namespace(&self, application: &str, namespace: &str) -> Result<(), StoreError>;
}

/// Version-qualified namespace name: the bare name for version 1 (the
/// backward-compatible default layout), `name_<version>` otherwise.
pub fn qualified_name(namespace: &str, version: u32) -> String {
    if version == 1 {
        namespace.to_string()
    } else {
        format!("{namespace}_{version}")
    }
}
