//! Query filters for event search.

use crate::core::Event;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// Criteria for [`EventStore::search`](super::EventStore::search).
///
/// Results are ordered by clock; `offset` and `limit` apply after ordering.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    pub container_id: Option<Uuid>,
    pub event_type: Option<String>,
    pub parent_id: Option<Uuid>,
    pub version: Option<u32>,
    pub clock: Option<u64>,
    pub min_clock: Option<u64>,
    pub max_clock: Option<u64>,
    pub order: SortOrder,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container_id(mut self, container_id: Uuid) -> Self {
        self.container_id = Some(container_id);
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn parent_id(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn clock(mut self, clock: u64) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Inclusive lower clock bound.
    pub fn min_clock(mut self, clock: u64) -> Self {
        self.min_clock = Some(clock);
        self
    }

    /// Inclusive upper clock bound.
    pub fn max_clock(mut self, clock: u64) -> Self {
        self.max_clock = Some(clock);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Same criteria without `limit` and `offset`.
    pub fn unpaged(mut self) -> Self {
        self.limit = None;
        self.offset = 0;
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.container_id.map_or(true, |id| event.container_id == id)
            && self
                .event_type
                .as_deref()
                .map_or(true, |event_type| event.event_type == event_type)
            && self
                .parent_id
                .map_or(true, |id| event.parent_id == Some(id))
            && self.version.map_or(true, |version| event.version == version)
            && self.clock.map_or(true, |clock| event.clock == clock)
            && self.min_clock.map_or(true, |clock| event.clock >= clock)
            && self.max_clock.map_or(true, |clock| event.clock <= clock)
    }
}
