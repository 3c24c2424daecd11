//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing the local store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No platform configuration directory could be resolved.
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
}
