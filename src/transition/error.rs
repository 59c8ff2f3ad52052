//! Transition error types.

use crate::core::State;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A required payload field that is absent or null.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissingField {
    pub field: String,
    pub event_type: String,
}

impl MissingField {
    pub fn message(&self) -> String {
        format!("Missing required field: '{}'", self.field)
    }

    pub fn reason(&self) -> String {
        format!(
            "Event type '{}' requires '{}'",
            self.event_type, self.field
        )
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.reason())
    }
}

/// Reasons a candidate event may not be appended.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Unknown event type '{name}' for registry '{registry}'")]
    UnknownEventType { registry: String, name: String },

    /// Every missing field, not just the first.
    #[error("Validation error: {}", join_fields(.fields))]
    MissingRequiredField { fields: Vec<MissingField> },

    #[error("Event type '{event_type}' may not be the initial event")]
    IllegalInitialState { event_type: String },

    #[error("Event type '{event_type}' may not follow state {state}")]
    IllegalStateTransition { event_type: String, state: State },

    #[error("Event type '{event_type}' cannot start a version after {version}")]
    VersionOverflow { event_type: String, version: u32 },
}

impl TransitionError {
    /// HTTP-style status code for the error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownEventType { .. } => 404,
            Self::MissingRequiredField { .. } | Self::VersionOverflow { .. } => 422,
            Self::IllegalInitialState { .. } | Self::IllegalStateTransition { .. } => 403,
        }
    }

    pub fn missing_fields(&self) -> &[MissingField] {
        match self {
            Self::MissingRequiredField { fields } => fields,
            _ => &[],
        }
    }
}

fn join_fields(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(MissingField::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
