//! Event rows and event chains.
//!
//! Events are immutable facts about a container. Each one records the
//! accumulated state *after* it, its version, and a logical clock that is
//! assigned by storage at commit time.

use super::payload::Payload;
use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A persisted event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub event_type: String,
    /// Prior event in the same chain; `None` only for the first event of a version.
    pub parent_id: Option<Uuid>,
    pub container_id: Uuid,
    /// Container-scoped, gapless total order.
    pub clock: u64,
    pub state: State,
    pub version: u32,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether a re-read row is the same logical transition as `candidate`.
    ///
    /// Two writers racing to append the same transition produce rows that
    /// agree on event type, parent and container.
    pub fn is_similar_to(&self, candidate: &NewEvent) -> bool {
        self.event_type == candidate.event_type
            && self.parent_id == candidate.parent_id
            && self.container_id == candidate.container_id
    }

    /// Read-side view of the container state this event establishes.
    pub fn summary(&self) -> StateSummary {
        StateSummary {
            event_type: self.event_type.clone(),
            state: self.state.clone(),
            version: self.version,
            clock: self.clock,
        }
    }
}

/// An event that has not been written yet; storage assigns its clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub id: Uuid,
    pub event_type: String,
    pub parent_id: Option<Uuid>,
    pub container_id: Uuid,
    pub state: State,
    pub version: u32,
    pub payload: Payload,
}

impl NewEvent {
    /// Materialize the row once storage has assigned a clock.
    pub fn into_event(self, clock: u64, created_at: DateTime<Utc>) -> Event {
        Event {
            id: self.id,
            event_type: self.event_type,
            parent_id: self.parent_id,
            container_id: self.container_id,
            clock,
            state: self.state,
            version: self.version,
            payload: self.payload,
            created_at,
        }
    }
}

/// State, version, event type and clock of a container's latest event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub event_type: String,
    pub state: State,
    pub version: u32,
    pub clock: u64,
}

/// Clock-ordered chain of events for one container.
///
/// The chain is immutable - [`record`](EventChain::record) returns a new
/// chain with the event appended.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventChain {
    events: Vec<Event>,
}

impl EventChain {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Build a chain from events in any order; they are sorted by clock.
    pub fn from_events(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|event| event.clock);
        Self { events }
    }

    pub fn record(&self, event: Event) -> Self {
        let mut events = self.events.clone();
        events.push(event);
        Self { events }
    }

    /// States traversed, oldest first.
    pub fn get_path(&self) -> Vec<&State> {
        self.events.iter().map(|event| &event.state).collect()
    }

    /// Time between the first and the last event.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.events.first()?, self.events.last()?);
        last.created_at
            .signed_duration_since(first.created_at)
            .to_std()
            .ok()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn latest(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
