// ABOUTME: Wires state cells to the versioned store: restore on attach, debounced writes after.
// ABOUTME: Change bursts coalesce into one queued write of the latest state per quiet window.

use std::sync::Arc;
use std::time::Duration;

use statevault_core::StateCell;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::PersistOptions;
use crate::driver::StorageDriver;
use crate::error::StoreError;
use crate::queue::SerialTaskQueue;
use crate::versioned::VersionedStore;

/// Persistence front door: owns the versioned store and schedules all
/// durable writes through one injected [`SerialTaskQueue`].
///
/// Multiple `Persistence` instances sharing a queue share one total write
/// order; instances with separate queues are fully independent.
pub struct Persistence {
    store: Arc<VersionedStore>,
    queue: SerialTaskQueue,
    debounce_window: Duration,
    debug_logging: bool,
}

impl Persistence {
    /// Open the underlying versioned store (running migration and bulk-load
    /// to completion) and return the persistence front door. This is the
    /// only fallible step; everything after open is best-effort.
    pub async fn open(
        driver: &dyn StorageDriver,
        options: PersistOptions,
        queue: SerialTaskQueue,
    ) -> Result<Self, StoreError> {
        let store = VersionedStore::open(driver, &options).await?;
        Ok(Self {
            store: Arc::new(store),
            queue,
            debounce_window: options.debounce_window,
            debug_logging: options.debug_logging,
        })
    }

    pub fn store(&self) -> &Arc<VersionedStore> {
        &self.store
    }

    pub fn queue(&self) -> &SerialTaskQueue {
        &self.queue
    }

    /// Wait until every write scheduled so far has settled.
    pub async fn flush(&self) {
        self.queue.idle().await;
    }

    /// Put a cell under persistence.
    ///
    /// Restores the cell first: the stored snapshot is deep-merged over the
    /// cell's current (default) state, so restored values win and keys
    /// absent from the snapshot keep their defaults. The subscription is
    /// taken after that patch, so restoring never schedules a write.
    ///
    /// Thereafter every change notification resets the debounce timer; once
    /// the quiet window elapses uninterrupted, one write task is enqueued.
    /// The task snapshots the cell when it executes, not when the window
    /// elapsed, and swallows its own write error.
    pub fn attach(&self, cell: &StateCell) -> PersistHandle {
        if let Some(snapshot) = self.store.get_state(cell.id()) {
            cell.patch(snapshot);
        }

        let changes = cell.changes();
        let watcher = Watcher {
            cell: cell.clone(),
            store: Arc::clone(&self.store),
            queue: self.queue.clone(),
            window: self.debounce_window,
            debug_logging: self.debug_logging,
        };
        let task = tokio::spawn(watcher.run(changes));
        PersistHandle { task }
    }
}

/// Handle to one cell's persistence subscription. The subscription is
/// detached: dropping the handle leaves it running for the process
/// lifetime. `stop` ends it; writes already queued still complete.
pub struct PersistHandle {
    task: JoinHandle<()>,
}

impl PersistHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

struct Watcher {
    cell: StateCell,
    store: Arc<VersionedStore>,
    queue: SerialTaskQueue,
    window: Duration,
    debug_logging: bool,
}

impl Watcher {
    async fn run(self, mut changes: watch::Receiver<serde_json::Value>) {
        while changes.changed().await.is_ok() {
            // Quiet window: every further notification resets the timer.
            while let Ok(Ok(())) = timeout(self.window, changes.changed()).await {}

            let cell = self.cell.clone();
            let store = Arc::clone(&self.store);
            let debug_logging = self.debug_logging;
            self.queue.enqueue(async move {
                let state = cell.state();
                if let Err(e) = store.set_state(cell.id(), &state).await
                    && debug_logging
                {
                    tracing::warn!("durable write for {} failed: {}", cell.id(), e);
                }
            });
        }
    }
}
