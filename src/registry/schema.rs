//! Storage schema contract derived from a registry.
//!
//! Event tables are polymorphic, so column nullability cannot be declared
//! per column. Instead each registry yields a set of check constraints that
//! any persistence backend must enforce. They are plain data: renderable as
//! SQL check text, and evaluable against a candidate row.

use super::EventTypeRegistry;
use crate::core::{has_value, Payload};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Events must have a parent unless they are initial and in version 1.
    RequireParent { initial_event_types: Vec<String> },
    /// `field` must be non-null for the listed event types.
    RequireField {
        field: String,
        event_types: Vec<String>,
    },
}

/// A named check constraint over an event row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConstraint {
    pub name: String,
    pub kind: ConstraintKind,
}

impl CheckConstraint {
    /// SQL check expression for this constraint.
    pub fn sql(&self) -> String {
        match &self.kind {
            ConstraintKind::RequireParent {
                initial_event_types,
            } if initial_event_types.is_empty() => "parent_id IS NOT NULL".to_string(),
            ConstraintKind::RequireParent {
                initial_event_types,
            } => format!(
                "parent_id IS NOT NULL OR (version = 1 AND event_type IN ({}))",
                join_event_types(initial_event_types)
            ),
            ConstraintKind::RequireField { field, event_types } => format!(
                "{field} IS NOT NULL OR event_type NOT IN ({})",
                join_event_types(event_types)
            ),
        }
    }

    /// Whether a row with these columns satisfies the constraint.
    pub fn check(
        &self,
        event_type: &str,
        parent_id: Option<Uuid>,
        version: u32,
        payload: &Payload,
    ) -> bool {
        match &self.kind {
            ConstraintKind::RequireParent {
                initial_event_types,
            } => {
                parent_id.is_some()
                    || (version == 1 && initial_event_types.iter().any(|name| name == event_type))
            }
            ConstraintKind::RequireField { field, event_types } => {
                has_value(payload, field) || !event_types.iter().any(|name| name == event_type)
            }
        }
    }
}

fn join_event_types(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(",")
}

impl EventTypeRegistry {
    /// Check constraints an event table named `table_name` must carry.
    pub fn schema_constraints(&self, table_name: &str) -> Vec<CheckConstraint> {
        let mut constraints = vec![CheckConstraint {
            name: format!("require_{table_name}_parent_id"),
            kind: ConstraintKind::RequireParent {
                initial_event_types: self
                    .initial_event_types()
                    .map(|event_type| event_type.name().to_string())
                    .collect(),
            },
        }];

        for field in self.required_field_names() {
            constraints.push(CheckConstraint {
                name: format!("require_{table_name}_{field}"),
                kind: ConstraintKind::RequireField {
                    field: field.to_string(),
                    event_types: self
                        .event_types_requiring(field)
                        .into_iter()
                        .map(|event_type| event_type.name().to_string())
                        .collect(),
                },
            });
        }

        constraints
    }
}
