//! Configuration errors for event type registries.

use crate::core::State;
use thiserror::Error;

/// Errors raised while building or validating a registry.
///
/// These are fatal at startup or test time and never surface on the
/// request path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Registry '{registry}' declares no event types. Add at least one event type")]
    NoEventTypes { registry: String },

    #[error("Duplicate event type '{name}' in registry '{registry}'")]
    DuplicateEventType { registry: String, name: String },

    #[error("Event type '{event_type}' refers to unknown event type '{name}'")]
    UnknownEventType { event_type: String, name: String },

    #[error("Event type '{event_type}' has no accumulation strategy. Call .accumulate(strategy)")]
    MissingAccumulation { event_type: String },

    #[error(
        "Registry '{registry}' has competing auto-transitions from {} state(s): {}",
        .states.len(),
        join_states(.states)
    )]
    InvalidAutoTransitions { registry: String, states: Vec<State> },

    #[error("Duplicate container mutator for event type '{event_type}'")]
    DuplicateMutator { event_type: String },
}

fn join_states(states: &[State]) -> String {
    states
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
