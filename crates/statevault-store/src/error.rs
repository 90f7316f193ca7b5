// ABOUTME: Error type shared across the statevault persistence engine.
// ABOUTME: Only initialization failures surface to callers; the rest are absorbed at their site.

use thiserror::Error;

/// Errors that can occur in the persistence engine.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage driver error: {0}")]
    Driver(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("migration failed: {0}")]
    Migration(String),
}
