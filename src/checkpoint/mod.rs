//! Checkpoints of container event chains.
//!
//! A [`ChainCheckpoint`] captures every event of one container so the chain
//! can be moved between stores, archived, or inspected offline. Imports are
//! verified against the registry before anything is restored: parent links,
//! clock order, and each event's state and version are recomputed.

use crate::core::{Event, EventChain};
use crate::registry::EventTypeRegistry;
use crate::store::{EventStore, InMemoryEventStore};
use crate::transition::process;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of one container's chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainCheckpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Name of the registry the chain was written with
    pub registry: String,

    pub container_id: Uuid,

    /// Every event of the container, oldest first
    pub chain: EventChain,
}

impl ChainCheckpoint {
    /// Snapshot a container's chain from `store`.
    pub fn capture<S: EventStore + ?Sized>(
        registry: &EventTypeRegistry,
        store: &S,
        container_id: Uuid,
    ) -> Result<Self, CheckpointError> {
        let chain = store.chain(container_id)?;
        debug!(container_id = %container_id, events = chain.len(), "Captured chain checkpoint");
        Ok(Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            registry: registry.name().to_string(),
            container_id,
            chain,
        })
    }

    /// The container's latest event.
    pub fn head(&self) -> Option<&Event> {
        self.chain.latest()
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|error| CheckpointError::SerializationFailed(error.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|error| CheckpointError::DeserializationFailed(error.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self)
            .map_err(|error| CheckpointError::SerializationFailed(error.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|error| CheckpointError::DeserializationFailed(error.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Check the chain against `registry`.
    ///
    /// Every event must belong to the container, link to its predecessor,
    /// carry a strictly larger clock, and record exactly the state and
    /// version the transition processor computes for it.
    pub fn verify(&self, registry: &EventTypeRegistry) -> Result<(), CheckpointError> {
        self.check_version()?;

        let mut parent: Option<&Event> = None;
        for event in self.chain.events() {
            let fail = |reason: String| CheckpointError::ValidationFailed {
                clock: event.clock,
                reason,
            };

            if event.container_id != self.container_id {
                return Err(fail(format!(
                    "event {} belongs to container {}",
                    event.id, event.container_id
                )));
            }
            if event.parent_id != parent.map(|parent| parent.id) {
                return Err(fail(format!("event {} is not linked to its predecessor", event.id)));
            }
            if let Some(parent) = parent {
                if event.clock <= parent.clock {
                    return Err(fail(format!(
                        "clock does not increase after {}",
                        parent.clock
                    )));
                }
            }

            let expected = process(registry, parent, &event.event_type, &event.payload)
                .map_err(|error| fail(error.to_string()))?;
            if expected.state != event.state {
                return Err(fail(format!(
                    "recorded state {} differs from computed state {}",
                    event.state, expected.state
                )));
            }
            if expected.version != event.version {
                return Err(fail(format!(
                    "recorded version {} differs from computed version {}",
                    event.version, expected.version
                )));
            }

            parent = Some(event);
        }

        Ok(())
    }

    /// Verify, then load the chain into `store`, keeping ids and clocks.
    pub fn restore(
        &self,
        registry: &EventTypeRegistry,
        store: &InMemoryEventStore,
    ) -> Result<usize, CheckpointError> {
        self.verify(registry)?;
        let restored = store.restore(self.chain.events().iter().cloned())?;
        debug!(container_id = %self.container_id, restored, "Restored chain checkpoint");
        Ok(restored)
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}
