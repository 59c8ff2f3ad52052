//! Request-path error types.

use crate::registry::RegistryError;
use crate::store::StoreError;
use crate::transition::TransitionError;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by [`EventFactory::create`](super::EventFactory::create).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppendError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The pessimistic path found the container busy.
    #[error("Container {container_id} is locked by another writer; retry later")]
    ContainerLockUnavailable { container_id: Uuid },

    /// Two different transitions collided on the same unique index key.
    #[error(
        "Concurrent state conflict on container {container_id}: \
         '{attempted}' collided with {} on {index}",
        describe_existing(.existing)
    )]
    ConcurrentStateConflict {
        container_id: Uuid,
        attempted: String,
        existing: Option<String>,
        index: String,
    },
}

impl AppendError {
    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ContainerLockUnavailable { .. })
    }

    /// HTTP-style status code for the error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Transition(error) => error.status_code(),
            Self::Store(StoreError::NotFound { .. }) => 404,
            Self::Store(StoreError::LockUnavailable { .. })
            | Self::ContainerLockUnavailable { .. }
            | Self::ConcurrentStateConflict { .. } => 409,
            Self::Store(_) | Self::Registry(_) => 500,
        }
    }

    /// Map a lock acquisition failure to its retryable request error.
    pub(crate) fn from_lock(error: StoreError) -> Self {
        match error {
            StoreError::LockUnavailable { container_id } => {
                Self::ContainerLockUnavailable { container_id }
            }
            other => Self::Store(other),
        }
    }
}

fn describe_existing(existing: &Option<String>) -> String {
    match existing {
        Some(event_type) => format!("'{event_type}'"),
        None => "an unreadable row".to_string(),
    }
}
