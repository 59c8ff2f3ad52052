//! Read-side rollups: one row per container.
//!
//! A rollup pairs a container's most recent event with the last non-null
//! value of every payload field seen anywhere in its chain, so readers can
//! show the current assignee even when the latest event did not carry one.

use super::error::StoreError;
use super::EventStore;
use crate::core::{Event, EventChain, Payload, State, StateSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RollUp {
    pub container_id: Uuid,
    pub latest: Event,
    /// Last non-null value of each field across the chain.
    pub fields: Payload,
    pub event_count: usize,
}

impl RollUp {
    /// Fold a chain into its rollup; `None` for an empty chain.
    ///
    /// With `sources`, field values are only taken from events of those types.
    pub fn from_chain(chain: &EventChain, sources: Option<&BTreeSet<String>>) -> Option<Self> {
        let latest = chain.latest()?.clone();
        let mut fields = Payload::new();
        let contributing = chain.events().iter().filter(|event| {
            sources.map_or(true, |sources| sources.contains(&event.event_type))
        });
        for event in contributing {
            for (field, value) in &event.payload {
                if !value.is_null() {
                    fields.insert(field.clone(), value.clone());
                }
            }
        }

        Some(Self {
            container_id: latest.container_id,
            latest,
            fields,
            event_count: chain.len(),
        })
    }

    pub fn state(&self) -> &State {
        &self.latest.state
    }

    pub fn summary(&self) -> StateSummary {
        self.latest.summary()
    }
}

/// Criteria for [`RollUpStore::search`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollUpFilter {
    /// Type of the latest event.
    pub event_type: Option<String>,
    /// Event type that must be a member of the current state.
    pub state_member: Option<String>,
    pub version: Option<u32>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl RollUpFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn state_member(mut self, event_type: impl Into<String>) -> Self {
        self.state_member = Some(event_type.into());
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
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

    pub fn matches(&self, rollup: &RollUp) -> bool {
        self.event_type
            .as_deref()
            .map_or(true, |event_type| rollup.latest.event_type == event_type)
            && self
                .state_member
                .as_deref()
                .map_or(true, |member| rollup.state().contains(member))
            && self
                .version
                .map_or(true, |version| rollup.latest.version == version)
    }
}

/// Rollup queries over an [`EventStore`].
pub struct RollUpStore<S: EventStore + ?Sized> {
    store: Arc<S>,
    sources: Option<BTreeSet<String>>,
}

impl<S: EventStore + ?Sized> RollUpStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sources: None,
        }
    }

    /// Only take last field values from events of these types.
    pub fn with_field_sources<I, T>(mut self, event_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.sources = Some(event_types.into_iter().map(Into::into).collect());
        self
    }

    pub fn retrieve(&self, container_id: Uuid) -> Result<Option<RollUp>, StoreError> {
        let chain = self.store.chain(container_id)?;
        Ok(RollUp::from_chain(&chain, self.sources.as_ref()))
    }

    /// Matching rollups, most recently updated first.
    pub fn search(&self, filter: &RollUpFilter) -> Result<Vec<RollUp>, StoreError> {
        let mut rollups = self.matching(filter)?;
        rollups.sort_by(|left, right| {
            right
                .latest
                .created_at
                .cmp(&left.latest.created_at)
                .then_with(|| left.container_id.cmp(&right.container_id))
        });

        Ok(rollups
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect())
    }

    pub fn count(&self, filter: &RollUpFilter) -> Result<usize, StoreError> {
        Ok(self.matching(filter)?.len())
    }

    fn matching(&self, filter: &RollUpFilter) -> Result<Vec<RollUp>, StoreError> {
        let mut rollups = Vec::new();
        for container_id in self.store.container_ids()? {
            if let Some(rollup) = self.retrieve(container_id)? {
                if filter.matches(&rollup) {
                    rollups.push(rollup);
                }
            }
        }
        Ok(rollups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, NewEvent};
    use crate::payload;
    use crate::store::InMemoryEventStore;

    fn append(
        store: &InMemoryEventStore,
        parent: Option<&Event>,
        container_id: Uuid,
        event_type: &str,
        state: State,
        payload: Payload,
    ) -> Event {
        store
            .create(NewEvent {
                id: Uuid::new_v4(),
                event_type: event_type.into(),
                parent_id: parent.map(|event| event.id),
                container_id,
                state,
                version: 1,
                payload,
            })
            .unwrap()
    }

    #[test]
    fn rollup_keeps_last_non_null_values() {
        let store = Arc::new(InMemoryEventStore::new());
        let container_id = Uuid::new_v4();
        let created = append(
            &store,
            None,
            container_id,
            "CREATED",
            State::singleton("CREATED"),
            payload!(),
        );
        let assigned = append(
            &store,
            Some(&created),
            container_id,
            "ASSIGNED",
            ["CREATED", "ASSIGNED"].into_iter().collect(),
            payload! { "assignee" => "Alice" },
        );
        let scheduled = append(
            &store,
            Some(&assigned),
            container_id,
            "SCHEDULED",
            ["CREATED", "ASSIGNED", "SCHEDULED"].into_iter().collect(),
            payload! { "assignee" => FieldValue::Null, "deadline" => 5_i64 },
        );

        let rollups = RollUpStore::new(Arc::clone(&store));
        let rollup = rollups.retrieve(container_id).unwrap().unwrap();

        assert_eq!(rollup.latest, scheduled);
        assert_eq!(rollup.event_count, 3);
        assert_eq!(rollup.fields["assignee"], FieldValue::Text("Alice".into()));
        assert_eq!(rollup.fields["deadline"], FieldValue::Integer(5));
        assert_eq!(rollup.summary().event_type, "SCHEDULED");
        assert!(rollups.retrieve(Uuid::new_v4()).unwrap().is_none());

        let scheduled_only = RollUpStore::new(store).with_field_sources(["SCHEDULED"]);
        let restricted = scheduled_only.retrieve(container_id).unwrap().unwrap();
        assert!(!restricted.fields.contains_key("assignee"));
        assert_eq!(restricted.fields["deadline"], FieldValue::Integer(5));
    }

    #[test]
    fn search_filters_on_latest_state() {
        let store = Arc::new(InMemoryEventStore::new());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let created = append(
            &store,
            None,
            first,
            "CREATED",
            State::singleton("CREATED"),
            payload!(),
        );
        append(
            &store,
            Some(&created),
            first,
            "ASSIGNED",
            ["CREATED", "ASSIGNED"].into_iter().collect(),
            payload! { "assignee" => "Alice" },
        );
        append(&store, None, second, "CREATED", State::singleton("CREATED"), payload!());

        let rollups = RollUpStore::new(store);

        assert_eq!(rollups.count(&RollUpFilter::new()).unwrap(), 2);
        assert_eq!(rollups.count(&RollUpFilter::new().state_member("CREATED")).unwrap(), 2);

        let assigned = rollups
            .search(&RollUpFilter::new().event_type("ASSIGNED"))
            .unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].container_id, first);

        assert_eq!(rollups.search(&RollUpFilter::new().limit(1)).unwrap().len(), 1);
        assert!(rollups
            .search(&RollUpFilter::new().version(2))
            .unwrap()
            .is_empty());
    }
}
