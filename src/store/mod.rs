//! Event storage.
//!
//! [`EventStore`] is the seam between the engine and a persistence backend.
//! Backends must provide per-container gapless clocks assigned at commit, a
//! non-blocking container lock, an insert that silently skips rows colliding
//! on the configured unique index, and the check constraints returned by
//! [`EventTypeRegistry::schema_constraints`](crate::registry::EventTypeRegistry::schema_constraints).
//!
//! [`InMemoryEventStore`] is the reference backend.

pub mod error;
mod filter;
mod index;
mod memory;
pub mod rollup;

pub use error::StoreError;
pub use filter::{EventFilter, SortOrder};
pub use index::{IndexElement, IndexElements, IndexValue};
pub use memory::InMemoryEventStore;
pub use rollup::{RollUp, RollUpFilter, RollUpStore};

use crate::core::{Event, EventChain, NewEvent};
use std::fmt;
use uuid::Uuid;

/// Exclusive right to append to one container.
///
/// The lock is released when the value is dropped.
pub struct ContainerLock {
    container_id: Uuid,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ContainerLock {
    /// A held lock that runs `release` when dropped.
    pub fn held(container_id: Uuid, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            container_id,
            release: Some(Box::new(release)),
        }
    }

    /// Placeholder for appends that do not take the lock.
    pub fn unlocked(container_id: Uuid) -> Self {
        Self {
            container_id,
            release: None,
        }
    }

    pub fn container_id(&self) -> Uuid {
        self.container_id
    }

    pub fn is_held(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for ContainerLock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for ContainerLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerLock")
            .field("container_id", &self.container_id)
            .field("held", &self.is_held())
            .finish()
    }
}

/// The most recent event of a container, read under its lock.
#[derive(Debug)]
pub struct LockedParent {
    pub event: Option<Event>,
    pub lock: ContainerLock,
}

/// Persistence backend for events.
pub trait EventStore: Send + Sync {
    /// Fetch one event by id.
    fn retrieve(&self, id: Uuid) -> Result<Event, StoreError>;

    /// Latest event of a container by clock.
    fn retrieve_most_recent(&self, container_id: Uuid) -> Result<Option<Event>, StoreError>;

    /// Latest event of a given type in a container.
    fn retrieve_most_recent_by_event_type(
        &self,
        container_id: Uuid,
        event_type: &str,
    ) -> Result<Option<Event>, StoreError>;

    /// Take the container's lock without waiting.
    ///
    /// Fails with [`StoreError::LockUnavailable`] when another writer
    /// holds it.
    fn lock_container(&self, container_id: Uuid) -> Result<ContainerLock, StoreError>;

    /// Plain insert; fails on any constraint violation.
    fn create(&self, event: NewEvent) -> Result<Event, StoreError>;

    /// Insert unless a row with the same values for `index` exists.
    ///
    /// Returns `None` when the insert was skipped. Check constraints still
    /// fail with [`StoreError::IntegrityViolation`].
    fn insert_if_absent(
        &self,
        event: NewEvent,
        index: &IndexElements,
    ) -> Result<Option<Event>, StoreError>;

    /// Most recent row sharing `candidate`'s values for `index`.
    fn retrieve_most_recent_matching(
        &self,
        index: &IndexElements,
        candidate: &NewEvent,
    ) -> Result<Option<Event>, StoreError>;

    fn search(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError>;

    /// Ids of every container with at least one event.
    fn container_ids(&self) -> Result<Vec<Uuid>, StoreError>;

    /// The unique index guarding concurrent appends.
    fn upsert_index_elements(&self) -> IndexElements {
        IndexElements::default()
    }

    fn retrieve_most_recent_with_lock(
        &self,
        container_id: Uuid,
    ) -> Result<LockedParent, StoreError> {
        let lock = self.lock_container(container_id)?;
        let event = self.retrieve_most_recent(container_id)?;
        Ok(LockedParent { event, lock })
    }

    fn count(&self, filter: &EventFilter) -> Result<usize, StoreError> {
        let unpaged = filter.clone().unpaged();
        Ok(self.search(&unpaged)?.len())
    }

    /// Every event of a container, oldest first.
    fn chain(&self, container_id: Uuid) -> Result<EventChain, StoreError> {
        let filter = EventFilter::new()
            .container_id(container_id)
            .order(SortOrder::Ascending);
        Ok(EventChain::from_events(self.search(&filter)?))
    }
}
