//! Required-field validation using Validation.
//!
//! All missing fields are collected in one pass so callers can report them
//! together.

use super::error::{MissingField, TransitionError};
use crate::core::{has_value, EventType, Payload};
use crate::registry::EventTypeRegistry;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Check every field `event_type` requires, accumulating ALL absences.
pub fn validate_required_fields(
    event_type: &EventType,
    payload: &Payload,
) -> Validation<(), NonEmptyVec<MissingField>> {
    let checks: Vec<Validation<(), NonEmptyVec<MissingField>>> = event_type
        .requires()
        .iter()
        .map(|field| {
            if has_value(payload, field) {
                Validation::success(())
            } else {
                Validation::fail(MissingField {
                    field: field.clone(),
                    event_type: event_type.name().to_string(),
                })
            }
        })
        .collect();

    Validation::all_vec(checks).map(|_| ())
}

/// Fields required by `event_type` that are absent or null in `payload`.
pub fn missing_required_fields(event_type: &EventType, payload: &Payload) -> Vec<MissingField> {
    match validate_required_fields(event_type, payload) {
        Validation::Success(_) => Vec::new(),
        Validation::Failure(errors) => errors.iter().cloned().collect(),
    }
}

impl EventTypeRegistry {
    /// Names of the required fields missing from `payload` for the named
    /// event type. Lets request layers validate before any storage work.
    pub fn missing_fields(
        &self,
        event_type: &str,
        payload: &Payload,
    ) -> Result<Vec<String>, TransitionError> {
        let event_type = self
            .get(event_type)
            .ok_or_else(|| TransitionError::UnknownEventType {
                registry: self.name().to_string(),
                name: event_type.to_string(),
            })?;

        Ok(missing_required_fields(event_type, payload)
            .into_iter()
            .map(|missing| missing.field)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{event_info, keep, FieldValue};
    use crate::payload;
    use crate::registry::fixtures::task_registry;

    #[test]
    fn validation_accumulates_all_missing_fields() {
        let registry = EventTypeRegistry::builder("shipment")
            .event_type(
                event_info("DISPATCHED")
                    .accumulate(keep())
                    .requires(["carrier", "tracking_number"]),
            )
            .build()
            .unwrap();
        let dispatched = registry.get("DISPATCHED").unwrap();

        match validate_required_fields(dispatched, &payload!()) {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.iter().any(|e| e.field == "carrier"));
                assert!(errors.iter().any(|e| e.field == "tracking_number"));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn validation_succeeds_without_requirements() {
        let registry = task_registry();
        let created = registry.get("CREATED").unwrap();

        assert!(validate_required_fields(created, &payload!()).is_success());
    }

    #[test]
    fn null_counts_as_missing() {
        let registry = task_registry();
        let assigned = registry.get("ASSIGNED").unwrap();
        let payload = payload! { "assignee" => FieldValue::Null };

        assert_eq!(
            missing_required_fields(assigned, &payload),
            vec![MissingField {
                field: "assignee".into(),
                event_type: "ASSIGNED".into(),
            }]
        );
    }

    #[test]
    fn registry_reports_missing_field_names() {
        let registry = task_registry();

        assert_eq!(
            registry.missing_fields("ASSIGNED", &payload!()).unwrap(),
            vec!["assignee".to_string()]
        );
        assert!(registry
            .missing_fields("ASSIGNED", &payload! { "assignee" => "Alice" })
            .unwrap()
            .is_empty());
        assert!(matches!(
            registry.missing_fields("PAUSED", &payload!()),
            Err(TransitionError::UnknownEventType { .. })
        ));
    }
}
