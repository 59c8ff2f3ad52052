//! In-memory event store.

use super::error::StoreError;
use super::filter::{EventFilter, SortOrder};
use super::index::{IndexElements, IndexValue};
use super::{ContainerLock, EventStore};
use crate::core::{Event, NewEvent, Payload};
use crate::registry::{CheckConstraint, EventTypeRegistry};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Default)]
struct Rows {
    events: Vec<Event>,
    positions: HashMap<Uuid, usize>,
    clocks: HashMap<Uuid, u64>,
}

impl Rows {
    fn conflicts(&self, index: &IndexElements, key: Option<Vec<IndexValue>>) -> bool {
        match key {
            Some(key) => self
                .events
                .iter()
                .any(|stored| index.key_of(stored).as_ref() == Some(&key)),
            None => false,
        }
    }

    fn clock_taken(&self, container_id: Uuid, clock: u64) -> bool {
        self.events
            .iter()
            .any(|stored| stored.container_id == container_id && stored.clock == clock)
    }

    fn push(&mut self, event: Event) {
        let clock = self.clocks.entry(event.container_id).or_insert(0);
        *clock = (*clock).max(event.clock);
        self.positions.insert(event.id, self.events.len());
        self.events.push(event);
    }
}

/// Thread-safe event store backed by process memory.
///
/// Enforces the same contract a SQL backend would: check constraints from
/// the registry, a unique index over [`IndexElements`], gapless
/// per-container clocks assigned at commit, and `NOWAIT` container locks.
///
/// # Example
///
/// ```rust
/// use eventsource::core::{current, event_info, NewEvent, State};
/// use eventsource::payload;
/// use eventsource::registry::EventTypeRegistry;
/// use eventsource::store::{EventStore, InMemoryEventStore};
/// use uuid::Uuid;
///
/// let registry = EventTypeRegistry::builder("task")
///     .event_type(event_info("CREATED").accumulate(current()))
///     .build()
///     .unwrap();
/// let store = InMemoryEventStore::for_registry(&registry, "task_event");
///
/// let event = store
///     .create(NewEvent {
///         id: Uuid::new_v4(),
///         event_type: "CREATED".into(),
///         parent_id: None,
///         container_id: Uuid::new_v4(),
///         state: State::singleton("CREATED"),
///         version: 1,
///         payload: payload!(),
///     })
///     .unwrap();
///
/// assert_eq!(event.clock, 1);
/// ```
pub struct InMemoryEventStore {
    table_name: String,
    constraints: Vec<CheckConstraint>,
    index: IndexElements,
    rows: RwLock<Rows>,
    locks: Arc<Mutex<HashSet<Uuid>>>,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventStore {
    /// Store without check constraints.
    pub fn new() -> Self {
        Self {
            table_name: "event".to_string(),
            constraints: Vec::new(),
            index: IndexElements::default(),
            rows: RwLock::new(Rows::default()),
            locks: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Store enforcing the check constraints `registry` implies.
    pub fn for_registry(registry: &EventTypeRegistry, table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            constraints: registry.schema_constraints(table_name),
            ..Self::new()
        }
    }

    pub fn with_index_elements(mut self, index: IndexElements) -> Self {
        self.index = index;
        self
    }

    pub fn constraints(&self) -> &[CheckConstraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.rows.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_locked(&self, container_id: Uuid) -> bool {
        self.locks.lock().contains(&container_id)
    }

    /// Load previously persisted events, keeping their clocks.
    ///
    /// All or nothing: every event is checked against the stored rows and
    /// the rest of the batch before any becomes visible.
    pub fn restore(&self, events: impl IntoIterator<Item = Event>) -> Result<usize, StoreError> {
        let mut rows = self.rows.write();
        let mut staged = rows.clone();
        let mut restored = 0;
        for event in events {
            self.check_restored(&staged, &event)?;
            staged.push(event);
            restored += 1;
        }
        *rows = staged;
        debug!(table = %self.table_name, restored, "Restored events");
        Ok(restored)
    }

    fn check(&self, rows: &Rows, event: &NewEvent) -> Result<(), StoreError> {
        if rows.positions.contains_key(&event.id) {
            return Err(self.primary_key_violation());
        }
        self.check_constraints(
            &event.event_type,
            event.parent_id,
            event.version,
            &event.payload,
        )
    }

    fn check_restored(&self, rows: &Rows, event: &Event) -> Result<(), StoreError> {
        if rows.positions.contains_key(&event.id) {
            return Err(self.primary_key_violation());
        }
        if rows.clock_taken(event.container_id, event.clock) {
            return Err(StoreError::IntegrityViolation {
                constraint: format!("{}_container_id_clock_key", self.table_name),
            });
        }
        self.check_constraints(
            &event.event_type,
            event.parent_id,
            event.version,
            &event.payload,
        )?;
        if rows.conflicts(&self.index, self.index.key_of(event)) {
            return Err(StoreError::IntegrityViolation {
                constraint: self.index.name(),
            });
        }
        Ok(())
    }

    fn check_constraints(
        &self,
        event_type: &str,
        parent_id: Option<Uuid>,
        version: u32,
        payload: &Payload,
    ) -> Result<(), StoreError> {
        match self
            .constraints
            .iter()
            .find(|constraint| !constraint.check(event_type, parent_id, version, payload))
        {
            Some(constraint) => Err(StoreError::IntegrityViolation {
                constraint: constraint.name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn primary_key_violation(&self) -> StoreError {
        StoreError::IntegrityViolation {
            constraint: format!("{}_pkey", self.table_name),
        }
    }

    fn commit(&self, rows: &mut Rows, event: NewEvent) -> Event {
        let clock = rows.clocks.get(&event.container_id).copied().unwrap_or(0) + 1;
        let event = event.into_event(clock, Utc::now());
        debug!(
            table = %self.table_name,
            event_id = %event.id,
            container_id = %event.container_id,
            event_type = %event.event_type,
            clock,
            "Committed event"
        );
        rows.push(event.clone());
        event
    }
}

impl EventStore for InMemoryEventStore {
    fn retrieve(&self, id: Uuid) -> Result<Event, StoreError> {
        let rows = self.rows.read();
        rows.positions
            .get(&id)
            .map(|&position| rows.events[position].clone())
            .ok_or(StoreError::NotFound { id })
    }

    fn retrieve_most_recent(&self, container_id: Uuid) -> Result<Option<Event>, StoreError> {
        let rows = self.rows.read();
        Ok(rows
            .events
            .iter()
            .filter(|event| event.container_id == container_id)
            .max_by_key(|event| event.clock)
            .cloned())
    }

    fn retrieve_most_recent_by_event_type(
        &self,
        container_id: Uuid,
        event_type: &str,
    ) -> Result<Option<Event>, StoreError> {
        let rows = self.rows.read();
        Ok(rows
            .events
            .iter()
            .filter(|event| event.container_id == container_id && event.event_type == event_type)
            .max_by_key(|event| event.clock)
            .cloned())
    }

    fn lock_container(&self, container_id: Uuid) -> Result<ContainerLock, StoreError> {
        if !self.locks.lock().insert(container_id) {
            debug!(container_id = %container_id, "Container lock unavailable");
            return Err(StoreError::LockUnavailable { container_id });
        }

        let locks = Arc::clone(&self.locks);
        Ok(ContainerLock::held(container_id, move || {
            locks.lock().remove(&container_id);
        }))
    }

    fn create(&self, event: NewEvent) -> Result<Event, StoreError> {
        let mut rows = self.rows.write();
        self.check(&rows, &event)?;
        if rows.conflicts(&self.index, self.index.key_of_new(&event)) {
            return Err(StoreError::IntegrityViolation {
                constraint: self.index.name(),
            });
        }
        Ok(self.commit(&mut rows, event))
    }

    fn insert_if_absent(
        &self,
        event: NewEvent,
        index: &IndexElements,
    ) -> Result<Option<Event>, StoreError> {
        let mut rows = self.rows.write();
        self.check(&rows, &event)?;
        if rows.conflicts(index, index.key_of_new(&event)) {
            debug!(
                table = %self.table_name,
                index = %index.name(),
                event_type = %event.event_type,
                "Skipped insert on index conflict"
            );
            return Ok(None);
        }
        Ok(Some(self.commit(&mut rows, event)))
    }

    fn retrieve_most_recent_matching(
        &self,
        index: &IndexElements,
        candidate: &NewEvent,
    ) -> Result<Option<Event>, StoreError> {
        let Some(key) = index.key_of_new(candidate) else {
            return Ok(None);
        };
        let rows = self.rows.read();
        Ok(rows
            .events
            .iter()
            .filter(|event| index.key_of(event).as_ref() == Some(&key))
            .max_by_key(|event| (event.clock, event.created_at))
            .cloned())
    }

    fn search(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let rows = self.rows.read();
        let mut events: Vec<Event> = rows
            .events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();

        events.sort_by_key(|event| event.clock);
        if filter.order == SortOrder::Descending {
            events.reverse();
        }

        Ok(events
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn container_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        let rows = self.rows.read();
        let mut seen = HashSet::new();
        Ok(rows
            .events
            .iter()
            .map(|event| event.container_id)
            .filter(|id| seen.insert(*id))
            .collect())
    }

    fn upsert_index_elements(&self) -> IndexElements {
        self.index.clone()
    }
}
