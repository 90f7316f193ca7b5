// ABOUTME: Facade crate for statevault, re-exporting the core and store crates.
// ABOUTME: Pulls the state container, storage drivers, queue, and persistence wiring into one API.

//! Serialized, versioned key-value persistence for in-memory state
//! containers.
//!
//! State lives in [`StateCell`]s; a [`Persistence`] instance restores each
//! cell from a versioned durable namespace on attach and schedules
//! debounced, strictly ordered writes through a shared
//! [`SerialTaskQueue`] on every change.
//!
//! ```no_run
//! use statevault::{FsDriver, PersistOptions, Persistence, SerialTaskQueue, StateCell};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), statevault::StoreError> {
//! let driver = FsDriver::new("/var/lib/myapp");
//! let queue = SerialTaskQueue::new();
//! let persistence = Persistence::open(
//!     &driver,
//!     PersistOptions::new().application_name("myapp"),
//!     queue,
//! )
//! .await?;
//!
//! let settings = StateCell::new("settings", json!({"theme": "light"}));
//! let _handle = persistence.attach(&settings);
//!
//! settings.update(|s| s["theme"] = json!("dark"));
//! persistence.flush().await;
//! # Ok(())
//! # }
//! ```

pub use statevault_core::{StateCell, deep_merge};
pub use statevault_store::{
    FsDriver, MemoryDriver, MigrateFn, Namespace, PersistHandle, PersistOptions, Persistence,
    SerialTaskQueue, StorageDriver, StoreError, VersionedStore, qualified_name,
};
