//! Unique index definitions for the append protocol.

use crate::core::{Event, NewEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A column that can take part in the upsert unique index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexElement {
    ParentId,
    ContainerId,
    EventType,
    Version,
}

impl IndexElement {
    pub fn column(&self) -> &'static str {
        match self {
            Self::ParentId => "parent_id",
            Self::ContainerId => "container_id",
            Self::EventType => "event_type",
            Self::Version => "version",
        }
    }
}

/// Value of one index column for a row.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexValue {
    Id(Uuid),
    Text(String),
    Version(u32),
}

/// Ordered set of columns whose combined values must be unique.
///
/// Follows SQL semantics: a row with a null value in any indexed column
/// never conflicts, so first events (which have no parent) are not guarded
/// by the default `[ParentId]` index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexElements(Vec<IndexElement>);

impl Default for IndexElements {
    fn default() -> Self {
        Self(vec![IndexElement::ParentId])
    }
}

impl IndexElements {
    pub fn new(elements: impl IntoIterator<Item = IndexElement>) -> Self {
        Self(elements.into_iter().collect())
    }

    pub fn elements(&self) -> &[IndexElement] {
        &self.0
    }

    /// Constraint name, e.g. `unique_parent_id`.
    pub fn name(&self) -> String {
        let columns: Vec<&str> = self.0.iter().map(IndexElement::column).collect();
        format!("unique_{}", columns.join("_"))
    }

    /// Index key of a pending row, or `None` when a column is null.
    pub fn key_of_new(&self, event: &NewEvent) -> Option<Vec<IndexValue>> {
        self.key(
            &event.event_type,
            event.parent_id,
            event.container_id,
            event.version,
        )
    }

    /// Index key of a stored row, or `None` when a column is null.
    pub fn key_of(&self, event: &Event) -> Option<Vec<IndexValue>> {
        self.key(
            &event.event_type,
            event.parent_id,
            event.container_id,
            event.version,
        )
    }

    fn key(
        &self,
        event_type: &str,
        parent_id: Option<Uuid>,
        container_id: Uuid,
        version: u32,
    ) -> Option<Vec<IndexValue>> {
        self.0
            .iter()
            .map(|element| match element {
                IndexElement::ParentId => parent_id.map(IndexValue::Id),
                IndexElement::ContainerId => Some(IndexValue::Id(container_id)),
                IndexElement::EventType => Some(IndexValue::Text(event_type.to_string())),
                IndexElement::Version => Some(IndexValue::Version(version)),
            })
            .collect()
    }
}
