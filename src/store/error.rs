//! Storage error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by an [`EventStore`](super::EventStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Event {id} not found")]
    NotFound { id: Uuid },

    /// Another writer holds the container's lock; the caller should retry.
    #[error("Container {container_id} is locked by another writer")]
    LockUnavailable { container_id: Uuid },

    /// A check or uniqueness constraint rejected the row.
    #[error("Integrity constraint '{constraint}' violated")]
    IntegrityViolation { constraint: String },

    #[error("Storage backend failure: {0}")]
    Backend(String),
}
