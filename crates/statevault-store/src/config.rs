// ABOUTME: Configuration options for opening a versioned persistence store.
// ABOUTME: Carries namespace identity, schema version, debounce window, and the migrate callback.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::driver::Namespace;
use crate::error::StoreError;

/// Migration callback invoked with (old namespace, new namespace) when the
/// current namespace is empty and the previous version has data. Resolving
/// `Ok(true)` tells the store the old namespace may be dropped; `Ok(false)`
/// or an error leaves it intact for manual recovery.
pub type MigrateFn = Arc<
    dyn Fn(Arc<dyn Namespace>, Arc<dyn Namespace>) -> BoxFuture<'static, Result<bool, StoreError>>
        + Send
        + Sync,
>;

/// Options for opening a persistence store.
///
/// Defaults:
/// - `application_name`: "statevault"
/// - `store_namespace`: "keyvaluepairs"
/// - `schema_version`: 1 (must stay >= 1)
/// - `debug_logging`: false (absorbed failures are reported only when set)
/// - `debounce_window`: 100ms quiet window before a write is scheduled
/// - `migrate`: none (only consulted when `schema_version` > 1)
#[derive(Clone)]
pub struct PersistOptions {
    pub application_name: String,
    pub store_namespace: String,
    pub schema_version: u32,
    pub debug_logging: bool,
    pub debounce_window: Duration,
    pub migrate: Option<MigrateFn>,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            application_name: "statevault".to_string(),
            store_namespace: "keyvaluepairs".to_string(),
            schema_version: 1,
            debug_logging: false,
            debounce_window: Duration::from_millis(100),
            migrate: None,
        }
    }
}

impl PersistOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    pub fn store_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.store_namespace = namespace.into();
        self
    }

    pub fn schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    pub fn debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Install the migration callback. See [`MigrateFn`] for the contract.
    pub fn migrate<F, Fut>(mut self, migrate: F) -> Self
    where
        F: Fn(Arc<dyn Namespace>, Arc<dyn Namespace>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, StoreError>> + Send + 'static,
    {
        self.migrate = Some(Arc::new(move |old, new| migrate(old, new).boxed()));
        self
    }
}

impl fmt::Debug for PersistOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistOptions")
            .field("application_name", &self.application_name)
            .field("store_namespace", &self.store_namespace)
            .field("schema_version", &self.schema_version)
            .field("debug_logging", &self.debug_logging)
            .field("debounce_window", &self.debounce_window)
            .field("migrate", &self.migrate.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let options = PersistOptions::default();

        assert_eq!(options.application_name, "statevault");
        assert_eq!(options.store_namespace, "keyvaluepairs");
        assert_eq!(options.schema_version, 1);
        assert!(!options.debug_logging);
        assert_eq!(options.debounce_window, Duration::from_millis(100));
        assert!(options.migrate.is_none());
    }

    #[test]
    fn builder_overrides_defaults() {
        let options = PersistOptions::new()
            .application_name("myapp")
            .store_namespace("settings")
            .schema_version(3)
            .debug_logging(true)
            .debounce_window(Duration::from_millis(25))
            .migrate(|_old, _new| async { Ok(true) });

        assert_eq!(options.application_name, "myapp");
        assert_eq!(options.store_namespace, "settings");
        assert_eq!(options.schema_version, 3);
        assert!(options.debug_logging);
        assert_eq!(options.debounce_window, Duration::from_millis(25));
        assert!(options.migrate.is_some());
    }
}
