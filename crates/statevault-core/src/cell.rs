// ABOUTME: Watch-backed JSON state container with change subscription.
// ABOUTME: Every mutation notifies subscribers; snapshots are structural deep copies.

use serde_json::Value;
use tokio::sync::watch;

/// A mutable JSON state container identified by an entity key.
///
/// State lives inside a watch channel: every mutation notifies all
/// subscribers, and subscription outlives any particular caller. Handles
/// are cheap clones sharing the same underlying state.
#[derive(Clone)]
pub struct StateCell {
    id: String,
    tx: watch::Sender<Value>,
}

impl StateCell {
    /// Create a cell holding the given default state.
    pub fn new(id: impl Into<String>, defaults: Value) -> Self {
        let (tx, _) = watch::channel(defaults);
        Self { id: id.into(), tx }
    }

    /// The entity key this cell persists under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A structural deep copy of the current state.
    pub fn state(&self) -> Value {
        self.tx.borrow().clone()
    }

    /// Replace the entire state and notify subscribers.
    pub fn replace(&self, next: Value) {
        self.tx.send_replace(next);
    }

    /// Mutate the state in place and notify subscribers.
    pub fn update(&self, mutate: impl FnOnce(&mut Value)) {
        self.tx.send_modify(mutate);
    }

    /// Deep-merge `patch` over the current state and notify subscribers.
    /// Keys absent from the patch keep their current value.
    pub fn patch(&self, patch: Value) {
        self.tx.send_modify(|state| {
            let base = state.take();
            *state = crate::snapshot::deep_merge(base, patch);
        });
    }

    /// Subscribe to change notifications. The receiver starts with the
    /// current state marked as seen, so only mutations made after the
    /// subscription will wake it.
    pub fn changes(&self) -> watch::Receiver<Value> {
        self.tx.subscribe()
    }
}
