//! Event type registries.
//!
//! A registry is the closed, immutable set of event types for one entity
//! kind. It is built once at startup with [`RegistryBuilder`] and then shared
//! read-only by every request.
//!
//! The analyzer (see [`EventTypeRegistry::all_states`]) explores the state
//! space reachable from the initial event types and checks that
//! auto-transitions are never ambiguous.

mod analyzer;
pub mod builder;
pub mod error;
pub mod schema;

pub use analyzer::StateTransition;
pub use builder::RegistryBuilder;
pub use error::RegistryError;
pub use schema::{CheckConstraint, ConstraintKind};

use crate::core::EventType;
use std::collections::{BTreeMap, BTreeSet};

/// Immutable mapping from event type name to its metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventTypeRegistry {
    pub(crate) name: String,
    pub(crate) event_types: BTreeMap<String, EventType>,
}

impl EventTypeRegistry {
    pub fn builder(name: impl Into<String>) -> RegistryBuilder {
        RegistryBuilder::new(name)
    }

    /// Merge several registries into one.
    ///
    /// Fails fast with [`RegistryError::DuplicateEventType`] when two
    /// sources declare the same name.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eventsource::core::{event_info, keep};
    /// use eventsource::registry::{EventTypeRegistry, RegistryError};
    ///
    /// let basic = EventTypeRegistry::builder("basic")
    ///     .event_type(event_info("CREATED").accumulate(keep()))
    ///     .build()
    ///     .unwrap();
    /// let other = EventTypeRegistry::builder("other")
    ///     .event_type(event_info("CREATED").accumulate(keep()))
    ///     .build()
    ///     .unwrap();
    ///
    /// let result = EventTypeRegistry::union("task", &[&basic, &other]);
    /// assert!(matches!(result, Err(RegistryError::DuplicateEventType { .. })));
    /// ```
    pub fn union(
        name: impl Into<String>,
        sources: &[&EventTypeRegistry],
    ) -> Result<Self, RegistryError> {
        sources
            .iter()
            .fold(RegistryBuilder::new(name), |builder, source| {
                builder.include(source)
            })
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&EventType> {
        self.event_types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.event_types.contains_key(name)
    }

    /// Event types in lexicographic order of their names.
    pub fn iter(&self) -> impl Iterator<Item = &EventType> {
        self.event_types.values()
    }

    pub fn len(&self) -> usize {
        self.event_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_types.is_empty()
    }

    /// Event types that require `field` in their payload.
    pub fn event_types_requiring(&self, field: &str) -> Vec<&EventType> {
        self.iter()
            .filter(|event_type| event_type.requires().contains(field))
            .collect()
    }

    /// Every field name required by at least one event type.
    pub fn required_field_names(&self) -> BTreeSet<&str> {
        self.iter()
            .flat_map(|event_type| event_type.requires().iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Task lifecycle registries shared by tests across the crate.

    use super::*;
    use crate::core::{
        alias, all_of, any_of, but_not, current, event, event_info, keep, nothing, union,
        EventTypeInfo,
    };

    pub fn basic_task_event_types() -> Vec<EventTypeInfo> {
        vec![
            event_info("CREATED").follows(nothing()).accumulate(current()),
            event_info("ASSIGNED")
                .follows(all_of(["CREATED".into(), but_not("ASSIGNED")]))
                .accumulate(union())
                .requires(["assignee"]),
            event_info("SCHEDULED")
                .follows(all_of(["CREATED".into(), but_not("SCHEDULED")]))
                .accumulate(union())
                .requires(["deadline"]),
            event_info("STARTED")
                .follows(all_of(["ASSIGNED", "SCHEDULED"]))
                .accumulate(current()),
            event_info("CANCELED").follows(event("STARTED")).accumulate(current()),
            event_info("COMPLETED").follows(event("STARTED")).accumulate(current()),
            event_info("ENDED")
                .follows(event("COMPLETED"))
                .accumulate(current())
                .auto_transition(),
        ]
    }

    pub fn advanced_task_event_types() -> Vec<EventTypeInfo> {
        vec![
            event_info("REASSIGNED")
                .follows(event("STARTED"))
                .accumulate(keep())
                .requires(["assignee"]),
            event_info("RESCHEDULED")
                .follows(event("STARTED"))
                .accumulate(keep())
                .requires(["deadline"]),
            event_info("REVISED")
                .follows(any_of(["CREATED", "STARTED"]))
                .accumulate(alias("CREATED"))
                .restarting(),
        ]
    }

    pub fn basic_task_registry() -> EventTypeRegistry {
        RegistryBuilder::new("basic_task")
            .event_types(basic_task_event_types())
            .build()
            .unwrap()
    }

    pub fn task_registry() -> EventTypeRegistry {
        RegistryBuilder::new("task")
            .event_types(basic_task_event_types())
            .event_types(advanced_task_event_types())
            .build()
            .unwrap()
    }

    /// Two auto-transitions compete after CREATED.
    pub fn illegal_registry() -> EventTypeRegistry {
        RegistryBuilder::new("illegal")
            .event_type(event_info("CREATED").accumulate(current()))
            .event_type(
                event_info("ASSIGNED")
                    .follows("CREATED")
                    .accumulate(current())
                    .auto_transition(),
            )
            .event_type(
                event_info("SCHEDULED")
                    .follows("CREATED")
                    .accumulate(current())
                    .auto_transition(),
            )
            .build()
            .unwrap()
    }
}
