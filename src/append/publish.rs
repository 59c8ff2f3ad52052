//! Notification publishing.
//!
//! Publishing is fire-and-forget: the factory logs failures and never lets
//! them affect the append result.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to publish {media_type}: {message}")]
pub struct PublishError {
    pub media_type: String,
    pub message: String,
}

/// Sink for creation notifications.
pub trait Publisher: Send + Sync {
    fn publish(&self, media_type: &str, resource_uri: &str) -> Result<(), PublishError>;
}

/// Discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPublisher;

impl Publisher for NoopPublisher {
    fn publish(&self, _media_type: &str, _resource_uri: &str) -> Result<(), PublishError> {
        Ok(())
    }
}

/// One published notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub media_type: String,
    pub resource_uri: String,
}

/// Keeps notifications in memory, optionally failing every publish.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    notifications: Mutex<Vec<Notification>>,
    failure: Mutex<Option<String>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn media_types(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .map(|notification| notification.media_type.clone())
            .collect()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, media_type: &str, resource_uri: &str) -> Result<(), PublishError> {
        if let Some(message) = self.failure.lock().clone() {
            return Err(PublishError {
                media_type: media_type.to_string(),
                message,
            });
        }

        self.notifications.lock().push(Notification {
            media_type: media_type.to_string(),
            resource_uri: resource_uri.to_string(),
        });
        Ok(())
    }
}
