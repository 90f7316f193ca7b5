// ABOUTME: In-memory state containers for the statevault persistence engine.
// ABOUTME: Provides the watch-backed StateCell and the JSON deep-merge utility.

pub mod cell;
pub mod snapshot;

pub use cell::StateCell;
pub use snapshot::deep_merge;
