//! Checkpoint error types.

use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Checkpoint version is not supported by this version
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The chain breaks an event-sourcing invariant
    #[error("Checkpoint validation failed at clock {clock}: {reason}")]
    ValidationFailed { clock: u64, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
