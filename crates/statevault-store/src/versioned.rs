// ABOUTME: Versioned durable namespace: detect-empty, maybe-migrate, stamp-version, bulk-load.
// ABOUTME: Serves synchronous restores from the startup mirror and writes straight to durable storage.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::{MigrateFn, PersistOptions};
use crate::driver::{Namespace, StorageDriver, qualified_name};
use crate::error::StoreError;

/// Reserved entry recording the schema version that last initialized the
/// namespace. Stored as the decimal string of the version number.
pub const VERSION_KEY: &str = "version";

/// A durable key-value namespace bound to one schema version.
///
/// `open` runs the full initialization sequence before returning: open the
/// version-qualified namespace, migrate from the immediately preceding
/// version if the namespace is empty and a callback was supplied, stamp the
/// version marker, then mirror every durable entry into the fast-read
/// cache. Once open, `get_state` is served synchronously from that mirror
/// while `set_state` writes straight to durable storage; the mirror is a
/// startup snapshot, not a write-through cache.
pub struct VersionedStore {
    namespace: Arc<dyn Namespace>,
    cache: HashMap<String, String>,
    schema_version: u32,
    debug_logging: bool,
}

impl VersionedStore {
    /// Open the store, migrating and stamping as needed.
    ///
    /// Only failures in this sequence surface to the caller; a failed
    /// migration is absorbed (the previous namespace is left intact for
    /// manual recovery) and the store proceeds empty.
    pub async fn open(
        driver: &dyn StorageDriver,
        options: &PersistOptions,
    ) -> Result<Self, StoreError> {
        if options.schema_version < 1 {
            return Err(StoreError::Config(format!(
                "schema_version must be >= 1, got {}",
                options.schema_version
            )));
        }

        let application = &options.application_name;
        let current_name = qualified_name(&options.store_namespace, options.schema_version);
        let namespace = driver.open(application, &current_name).await?;

        if namespace.keys().await?.is_empty() {
            tracing::debug!(
                "namespace {}/{} empty, initializing at version {}",
                application,
                current_name,
                options.schema_version
            );

            if options.schema_version > 1
                && let Some(migrate) = &options.migrate
                && let Err(e) = run_migration(driver, options, migrate, &namespace).await
            {
                tracing::warn!(
                    "migration to version {} failed, previous namespace left intact: {}",
                    options.schema_version,
                    e
                );
            }

            if namespace.get_item(VERSION_KEY).await?.is_none() {
                namespace
                    .set_item(VERSION_KEY, &options.schema_version.to_string())
                    .await?;
            }
        }

        // Full mirror of the durable namespace, listed after any migration
        // so freshly migrated entries are restorable this session.
        let mut cache = HashMap::new();
        for key in namespace.keys().await? {
            if let Some(value) = namespace.get_item(&key).await? {
                cache.insert(key, value);
            }
        }
        tracing::debug!(
            "loaded {} entries from {}/{}",
            cache.len(),
            application,
            current_name
        );

        Ok(Self {
            namespace,
            cache,
            schema_version: options.schema_version,
            debug_logging: options.debug_logging,
        })
    }

    /// Restore the snapshot for an entity from the startup mirror.
    /// Returns None when no entry exists or the stored value does not
    /// parse; the caller falls back to its defaults either way.
    pub fn get_state(&self, key: &str) -> Option<Value> {
        let raw = self.cache.get(key)?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                if self.debug_logging {
                    tracing::warn!("stored snapshot for {} is not valid JSON, treating as absent: {}", key, e);
                }
                None
            }
        }
    }

    /// Serialize and durably write the snapshot for an entity. Does not
    /// touch the startup mirror.
    pub async fn set_state(&self, key: &str, state: &Value) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state)?;
        self.namespace.set_item(key, &raw).await
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }
}

/// One-version-back migration. Returns Ok(()) when there was nothing to
/// migrate or the old namespace was migrated and dropped; any other outcome
/// is an error for the caller to absorb.
async fn run_migration(
    driver: &dyn StorageDriver,
    options: &PersistOptions,
    migrate: &MigrateFn,
    current: &Arc<dyn Namespace>,
) -> Result<(), StoreError> {
    let application = &options.application_name;
    let old_name = qualified_name(&options.store_namespace, options.schema_version - 1);
    let old = driver.open(application, &old_name).await?;
    if old.keys().await?.is_empty() {
        return Ok(());
    }

    match (migrate)(Arc::clone(&old), Arc::clone(current)).await {
        Ok(true) => {
            driver.drop_namespace(application, &old_name).await?;
            tracing::debug!(
                "migrated {}/{} to version {} and dropped it",
                application,
                old_name,
                options.schema_version
            );
            Ok(())
        }
        Ok(false) => Err(StoreError::Migration(
            "migration callback reported failure".to_string(),
        )),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDriver;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn options_v(version: u32) -> PersistOptions {
        PersistOptions::new().schema_version(version)
    }

    async fn seed(driver: &MemoryDriver, namespace: &str, key: &str, value: &str) {
        let ns = driver.open("statevault", namespace).await.unwrap();
        ns.set_item(key, value).await.unwrap();
    }

    /// Copies every entry from the old namespace into the new one.
    fn copy_all_migration() -> PersistOptions {
        options_v(2).migrate(|old, new| async move {
            for key in old.keys().await? {
                if key != VERSION_KEY
                    && let Some(value) = old.get_item(&key).await?
                {
                    new.set_item(&key, &value).await?;
                }
            }
            Ok(true)
        })
    }

    #[tokio::test]
    async fn fresh_namespace_is_stamped_with_version() {
        let driver = MemoryDriver::new();
        let store = VersionedStore::open(&driver, &options_v(1)).await.unwrap();
        assert_eq!(store.schema_version(), 1);

        // Version 1 uses the bare namespace name.
        let ns = driver.open("statevault", "keyvaluepairs").await.unwrap();
        assert_eq!(ns.get_item(VERSION_KEY).await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn nonempty_namespace_is_not_restamped() {
        let driver = MemoryDriver::new();
        seed(&driver, "keyvaluepairs", "store-a", "{\"count\":1}").await;

        VersionedStore::open(&driver, &options_v(1)).await.unwrap();

        let ns = driver.open("statevault", "keyvaluepairs").await.unwrap();
        assert_eq!(ns.get_item(VERSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_schema_version_zero() {
        let driver = MemoryDriver::new();
        let result = VersionedStore::open(&driver, &options_v(0)).await;
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn successful_migration_moves_data_and_drops_old_namespace() {
        let driver = MemoryDriver::new();
        seed(&driver, "keyvaluepairs", "store-a", "{\"count\":9}").await;
        seed(&driver, "keyvaluepairs", VERSION_KEY, "1").await;

        let store = VersionedStore::open(&driver, &copy_all_migration())
            .await
            .unwrap();

        let old = driver.open("statevault", "keyvaluepairs").await.unwrap();
        assert!(old.keys().await.unwrap().is_empty(), "old namespace dropped");

        let new = driver.open("statevault", "keyvaluepairs_2").await.unwrap();
        assert_eq!(new.get_item(VERSION_KEY).await.unwrap().as_deref(), Some("2"));
        assert_eq!(
            new.get_item("store-a").await.unwrap().as_deref(),
            Some("{\"count\":9}")
        );

        // Migrated data is restorable in the same session.
        assert_eq!(store.get_state("store-a"), Some(json!({"count": 9})));
    }

    #[tokio::test]
    async fn declined_migration_keeps_old_namespace() {
        let driver = MemoryDriver::new();
        seed(&driver, "keyvaluepairs", "store-a", "{\"count\":9}").await;

        let options = options_v(2).migrate(|_old, _new| async { Ok(false) });
        VersionedStore::open(&driver, &options).await.unwrap();

        let old = driver.open("statevault", "keyvaluepairs").await.unwrap();
        assert_eq!(
            old.get_item("store-a").await.unwrap().as_deref(),
            Some("{\"count\":9}")
        );

        let new = driver.open("statevault", "keyvaluepairs_2").await.unwrap();
        assert_eq!(new.get_item(VERSION_KEY).await.unwrap().as_deref(), Some("2"));
        assert_eq!(new.get_item("store-a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_migration_keeps_old_namespace_and_open_succeeds() {
        let driver = MemoryDriver::new();
        seed(&driver, "keyvaluepairs", "store-a", "{\"count\":9}").await;

        let options = options_v(2).migrate(|_old, _new| async {
            Err(StoreError::Migration("disk on fire".to_string()))
        });
        let store = VersionedStore::open(&driver, &options).await.unwrap();
        assert_eq!(store.get_state("store-a"), None);

        let old = driver.open("statevault", "keyvaluepairs").await.unwrap();
        assert!(!old.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn migration_skipped_when_old_namespace_is_empty() {
        let driver = MemoryDriver::new();
        let called = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&called);
        let options = options_v(2).migrate(move |_old, _new| {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok(true)
            }
        });
        VersionedStore::open(&driver, &options).await.unwrap();

        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn migration_skipped_when_current_namespace_has_data() {
        let driver = MemoryDriver::new();
        seed(&driver, "keyvaluepairs", "store-a", "{\"old\":true}").await;
        seed(&driver, "keyvaluepairs_2", "store-a", "{\"new\":true}").await;
        let called = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&called);
        let options = options_v(2).migrate(move |_old, _new| {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok(true)
            }
        });
        let store = VersionedStore::open(&driver, &options).await.unwrap();

        assert!(!called.load(Ordering::SeqCst));
        assert_eq!(store.get_state("store-a"), Some(json!({"new": true})));
    }

    #[tokio::test]
    async fn migration_not_attempted_without_callback() {
        let driver = MemoryDriver::new();
        seed(&driver, "keyvaluepairs", "store-a", "{\"count\":9}").await;

        VersionedStore::open(&driver, &options_v(2)).await.unwrap();

        let old = driver.open("statevault", "keyvaluepairs").await.unwrap();
        assert!(!old.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_state_returns_none_for_missing_key() {
        let driver = MemoryDriver::new();
        let store = VersionedStore::open(&driver, &options_v(1)).await.unwrap();
        assert_eq!(store.get_state("store-a"), None);
    }

    #[tokio::test]
    async fn get_state_treats_unparseable_value_as_absent() {
        let driver = MemoryDriver::new();
        seed(&driver, "keyvaluepairs", "store-a", "not json {").await;

        let store = VersionedStore::open(&driver, &options_v(1)).await.unwrap();
        assert_eq!(store.get_state("store-a"), None);
    }

    #[tokio::test]
    async fn set_state_writes_durably_without_touching_the_mirror() {
        let driver = MemoryDriver::new();
        let store = VersionedStore::open(&driver, &options_v(1)).await.unwrap();

        store
            .set_state("store-a", &json!({"count": 4}))
            .await
            .unwrap();

        // Mirror still reflects the startup listing.
        assert_eq!(store.get_state("store-a"), None);

        // A new session sees the write.
        let reopened = VersionedStore::open(&driver, &options_v(1)).await.unwrap();
        assert_eq!(reopened.get_state("store-a"), Some(json!({"count": 4})));
    }
}
