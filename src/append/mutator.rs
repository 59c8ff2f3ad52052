//! Container mutators.
//!
//! Events often need to be mirrored onto the container record they belong
//! to (e.g. stamping `completed_at` on a task). Mutators are registered once
//! per event type, plus common mutators that run for every event, and are
//! applied after each committed event, cascaded ones included.

use crate::core::Event;
use crate::registry::RegistryError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Function applying one event to a container record.
pub type Mutator<C> = Box<dyn Fn(&mut C, &Event) + Send + Sync>;

/// Immutable mutator table.
pub struct ContainerMutators<C> {
    common: Vec<Mutator<C>>,
    by_event_type: HashMap<String, Mutator<C>>,
}

impl<C> ContainerMutators<C> {
    pub fn builder() -> ContainerMutatorsBuilder<C> {
        ContainerMutatorsBuilder {
            common: Vec::new(),
            by_event_type: Vec::new(),
        }
    }

    /// Run the common mutators, then the event type's own mutator.
    pub fn apply(&self, container: &mut C, event: &Event) {
        for mutator in &self.common {
            mutator(container, event);
        }
        if let Some(mutator) = self.by_event_type.get(&event.event_type) {
            mutator(container, event);
        }
    }

    pub fn handles(&self, event_type: &str) -> bool {
        self.by_event_type.contains_key(event_type)
    }
}

impl<C> fmt::Debug for ContainerMutators<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut event_types: Vec<&String> = self.by_event_type.keys().collect();
        event_types.sort();
        f.debug_struct("ContainerMutators")
            .field("common", &self.common.len())
            .field("event_types", &event_types)
            .finish()
    }
}

/// Builder for [`ContainerMutators`].
pub struct ContainerMutatorsBuilder<C> {
    common: Vec<Mutator<C>>,
    by_event_type: Vec<(String, Mutator<C>)>,
}

impl<C> ContainerMutatorsBuilder<C> {
    /// Mutator run for every event.
    pub fn common(mut self, mutator: impl Fn(&mut C, &Event) + Send + Sync + 'static) -> Self {
        self.common.push(Box::new(mutator));
        self
    }

    /// Mutator run for events of `event_type`.
    pub fn on(
        mut self,
        event_type: impl Into<String>,
        mutator: impl Fn(&mut C, &Event) + Send + Sync + 'static,
    ) -> Self {
        self.by_event_type
            .push((event_type.into(), Box::new(mutator)));
        self
    }

    /// Fails when an event type has more than one mutator.
    pub fn build(self) -> Result<ContainerMutators<C>, RegistryError> {
        let mut by_event_type = HashMap::new();
        for (event_type, mutator) in self.by_event_type {
            if by_event_type.contains_key(&event_type) {
                return Err(RegistryError::DuplicateMutator { event_type });
            }
            by_event_type.insert(event_type, mutator);
        }

        Ok(ContainerMutators {
            common: self.common,
            by_event_type,
        })
    }
}

/// Receives every event the factory commits.
pub trait ContainerUpdater: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// In-memory container records kept current by [`ContainerMutators`].
///
/// A container is created from `C::default()` on its first event.
pub struct ContainerStore<C> {
    mutators: ContainerMutators<C>,
    containers: RwLock<HashMap<Uuid, C>>,
}

impl<C: Clone + Default> ContainerStore<C> {
    pub fn new(mutators: ContainerMutators<C>) -> Self {
        Self {
            mutators,
            containers: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, container_id: Uuid) -> Option<C> {
        self.containers.read().get(&container_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.containers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Clone + Default + Send + Sync> ContainerUpdater for ContainerStore<C> {
    fn on_event(&self, event: &Event) {
        let mut containers = self.containers.write();
        let container = containers.entry(event.container_id).or_default();
        self.mutators.apply(container, event);
    }
}
