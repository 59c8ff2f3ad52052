//! Builder for constructing event type registries.

use super::error::RegistryError;
use super::EventTypeRegistry;
use crate::core::{EventType, EventTypeInfo};
use std::collections::BTreeMap;

/// Builder for an [`EventTypeRegistry`] with a fluent API.
///
/// Building is where author-facing declarations are checked: names must be
/// unique, every declaration needs an explicit accumulation strategy, and
/// every name referenced from a grammar expression or strategy must exist.
///
/// # Example
///
/// ```rust
/// use eventsource::core::{event_info, keep};
/// use eventsource::registry::RegistryBuilder;
///
/// let registry = RegistryBuilder::new("simple")
///     .event_type(event_info("CREATED").accumulate(keep()))
///     .event_type(event_info("READY").follows("CREATED").accumulate(keep()))
///     .build()
///     .unwrap();
///
/// assert_eq!(registry.len(), 2);
/// ```
pub struct RegistryBuilder {
    name: String,
    declarations: Vec<EventTypeInfo>,
}

impl RegistryBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
        }
    }

    pub fn event_type(mut self, info: EventTypeInfo) -> Self {
        self.declarations.push(info);
        self
    }

    /// Add several declarations at once, e.g. a shared set of event types.
    pub fn event_types(mut self, infos: impl IntoIterator<Item = EventTypeInfo>) -> Self {
        self.declarations.extend(infos);
        self
    }

    /// Copy every event type of an existing registry.
    pub fn include(mut self, registry: &EventTypeRegistry) -> Self {
        self.declarations
            .extend(registry.iter().map(EventTypeInfo::from));
        self
    }

    /// Build the registry.
    /// Returns an error if the declarations are not structurally sound.
    pub fn build(self) -> Result<EventTypeRegistry, RegistryError> {
        if self.declarations.is_empty() {
            return Err(RegistryError::NoEventTypes {
                registry: self.name,
            });
        }

        let mut event_types = BTreeMap::new();
        for info in self.declarations {
            if event_types.contains_key(info.name()) {
                return Err(RegistryError::DuplicateEventType {
                    registry: self.name,
                    name: info.name,
                });
            }
            let accumulate = info
                .accumulate
                .clone()
                .ok_or_else(|| RegistryError::MissingAccumulation {
                    event_type: info.name.clone(),
                })?;
            event_types.insert(info.name.clone(), EventType::from_parts(info, accumulate));
        }

        for event_type in event_types.values() {
            let referenced = event_type
                .follows()
                .referenced_event_types()
                .into_iter()
                .chain(event_type.accumulation().referenced_event_types());
            for name in referenced {
                if !event_types.contains_key(name) {
                    return Err(RegistryError::UnknownEventType {
                        event_type: event_type.name().to_string(),
                        name: name.to_string(),
                    });
                }
            }
        }

        Ok(EventTypeRegistry {
            name: self.name,
            event_types,
        })
    }
}

impl From<&EventType> for EventTypeInfo {
    fn from(event_type: &EventType) -> Self {
        let mut info = EventTypeInfo::new(event_type.name())
            .follows(event_type.follows().clone())
            .accumulate(event_type.accumulation().clone())
            .requires(event_type.requires().iter().cloned());
        if event_type.is_restarting() {
            info = info.restarting();
        }
        if event_type.is_auto_transition() {
            info = info.auto_transition();
        }
        info
    }
}
