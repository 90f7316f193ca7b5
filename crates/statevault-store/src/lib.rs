// ABOUTME: Persistence engine for statevault: versioned durable namespaces and ordered writes.
// ABOUTME: Provides storage drivers, the serial task queue, the versioned store, and persist wiring.

pub mod config;
pub mod driver;
pub mod error;
pub mod fs;
pub mod memory;
pub mod persist;
pub mod queue;
pub mod versioned;

pub use config::{MigrateFn, PersistOptions};
pub use driver::{Namespace, StorageDriver, qualified_name};
pub use error::StoreError;
pub use fs::FsDriver;
pub use memory::MemoryDriver;
pub use persist::{Persistence, PersistHandle};
pub use queue::SerialTaskQueue;
pub use versioned::VersionedStore;
