//! Pure transition processing.
//!
//! Given the most recent event of a container (if any), a candidate event
//! type and its payload, decide whether the event may be appended and, if
//! so, which state and version it records. No storage is touched here.

use super::error::TransitionError;
use super::fields::missing_required_fields;
use crate::core::{Event, EventType, Payload, State};
use crate::registry::EventTypeRegistry;
use serde::{Deserialize, Serialize};

/// The state and version a new event will record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub event_type: String,
    pub state: State,
    pub version: u32,
}

/// Process a candidate event against its parent.
///
/// Checks run in a fixed order: the event type must be known, every
/// required field must be present, and the grammar must allow the event
/// after the parent's state (or, without a parent, the type must be
/// initial). The resulting state is the candidate's accumulation applied to
/// the parent's state, or to the empty state for a first event.
///
/// # Example
///
/// ```rust
/// use eventsource::core::{current, event_info, union, State};
/// use eventsource::payload;
/// use eventsource::registry::EventTypeRegistry;
/// use eventsource::transition::process;
///
/// let registry = EventTypeRegistry::builder("task")
///     .event_type(event_info("CREATED").accumulate(current()))
///     .event_type(event_info("ASSIGNED").follows("CREATED").accumulate(union()))
///     .build()
///     .unwrap();
///
/// let created = process(&registry, None, "CREATED", &payload!()).unwrap();
/// assert_eq!(created.state, State::singleton("CREATED"));
/// assert_eq!(created.version, 1);
///
/// let rejected = process(&registry, None, "ASSIGNED", &payload!());
/// assert!(rejected.is_err());
/// ```
pub fn process(
    registry: &EventTypeRegistry,
    parent: Option<&Event>,
    event_type: &str,
    payload: &Payload,
) -> Result<Transition, TransitionError> {
    let candidate = lookup(registry, event_type)?;

    let missing = missing_required_fields(candidate, payload);
    if !missing.is_empty() {
        return Err(TransitionError::MissingRequiredField { fields: missing });
    }

    check_legal(candidate, parent.map(|event| &event.state))?;

    let parent_version = parent.map(|event| event.version);
    let version = candidate
        .next_version(parent_version)
        .ok_or_else(|| TransitionError::VersionOverflow {
            event_type: candidate.name().to_string(),
            version: parent_version.unwrap_or_default(),
        })?;

    let state = match parent {
        Some(parent) => candidate.accumulate_state(&parent.state),
        None => candidate.accumulate_state(&State::empty()),
    };

    Ok(Transition {
        event_type: candidate.name().to_string(),
        state,
        version,
    })
}

/// Grammar check only: may `candidate` follow `parent_state`?
pub fn check_legal(
    candidate: &EventType,
    parent_state: Option<&State>,
) -> Result<(), TransitionError> {
    if candidate.is_legal_after(parent_state) {
        return Ok(());
    }

    Err(match parent_state {
        None => TransitionError::IllegalInitialState {
            event_type: candidate.name().to_string(),
        },
        Some(state) => TransitionError::IllegalStateTransition {
            event_type: candidate.name().to_string(),
            state: state.clone(),
        },
    })
}

pub(crate) fn lookup<'a>(
    registry: &'a EventTypeRegistry,
    event_type: &str,
) -> Result<&'a EventType, TransitionError> {
    registry
        .get(event_type)
        .ok_or_else(|| TransitionError::UnknownEventType {
            registry: registry.name().to_string(),
            name: event_type.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NewEvent;
    use crate::payload;
    use crate::registry::fixtures::task_registry;
    use chrono::Utc;
    use uuid::Uuid;

    fn state(members: &[&str]) -> State {
        members.iter().copied().collect()
    }

    fn stored(parent: Option<&Event>, transition: Transition) -> Event {
        NewEvent {
            id: Uuid::new_v4(),
            event_type: transition.event_type,
            parent_id: parent.map(|event| event.id),
            container_id: parent.map_or_else(Uuid::new_v4, |event| event.container_id),
            state: transition.state,
            version: transition.version,
            payload: payload!(),
        }
        .into_event(parent.map_or(1, |event| event.clock + 1), Utc::now())
    }

    fn append(registry: &EventTypeRegistry, parent: Option<&Event>, event_type: &str) -> Event {
        let payload = payload! {
            "assignee" => "Alice",
            "deadline" => Utc::now(),
        };
        let transition = process(registry, parent, event_type, &payload).unwrap();
        stored(parent, transition)
    }

    #[test]
    fn first_event_must_be_initial() {
        let registry = task_registry();

        let created = process(&registry, None, "CREATED", &payload!()).unwrap();
        assert_eq!(created.state, state(&["CREATED"]));
        assert_eq!(created.version, 1);

        assert_eq!(
            process(&registry, None, "STARTED", &payload!()).unwrap_err(),
            TransitionError::IllegalInitialState {
                event_type: "STARTED".into()
            }
        );
    }

    #[test]
    fn lifecycle_accumulates_state() {
        let registry = task_registry();
        let created = append(&registry, None, "CREATED");
        let assigned = append(&registry, Some(&created), "ASSIGNED");
        let scheduled = append(&registry, Some(&assigned), "SCHEDULED");
        let started = append(&registry, Some(&scheduled), "STARTED");
        let reassigned = append(&registry, Some(&started), "REASSIGNED");

        assert_eq!(assigned.state, state(&["CREATED", "ASSIGNED"]));
        assert_eq!(scheduled.state, state(&["CREATED", "ASSIGNED", "SCHEDULED"]));
        assert_eq!(started.state, state(&["STARTED"]));
        assert_eq!(reassigned.state, state(&["STARTED"]));
        assert_eq!(reassigned.version, 1);
    }

    #[test]
    fn assigned_twice_is_illegal() {
        let registry = task_registry();
        let created = append(&registry, None, "CREATED");
        let assigned = append(&registry, Some(&created), "ASSIGNED");

        let result = process(
            &registry,
            Some(&assigned),
            "ASSIGNED",
            &payload! { "assignee" => "Bob" },
        );

        assert_eq!(
            result.unwrap_err(),
            TransitionError::IllegalStateTransition {
                event_type: "ASSIGNED".into(),
                state: state(&["CREATED", "ASSIGNED"]),
            }
        );
    }

    #[test]
    fn initial_only_type_cannot_follow_a_parent() {
        let registry = task_registry();
        let created = append(&registry, None, "CREATED");

        assert!(matches!(
            process(&registry, Some(&created), "CREATED", &payload!()),
            Err(TransitionError::IllegalStateTransition { .. })
        ));
    }

    #[test]
    fn required_fields_are_checked_before_legality() {
        let registry = task_registry();

        let error = process(&registry, None, "ASSIGNED", &payload!()).unwrap_err();

        assert_eq!(error.missing_fields().len(), 1);
        assert_eq!(error.missing_fields()[0].field, "assignee");
    }

    #[test]
    fn restarting_event_bumps_version() {
        let registry = task_registry();
        let created = append(&registry, None, "CREATED");
        let assigned = append(&registry, Some(&created), "ASSIGNED");
        let revised = append(&registry, Some(&assigned), "REVISED");

        assert_eq!(revised.state, state(&["CREATED"]));
        assert_eq!(revised.version, 2);

        let reassigned = append(&registry, Some(&revised), "ASSIGNED");
        assert_eq!(reassigned.version, 2);
    }

    #[test]
    fn restarting_at_the_last_version_is_rejected() {
        let registry = task_registry();
        let created = append(&registry, None, "CREATED");
        let mut exhausted = append(&registry, Some(&created), "ASSIGNED");
        exhausted.version = u32::MAX;

        assert_eq!(
            process(&registry, Some(&exhausted), "REVISED", &payload!()).unwrap_err(),
            TransitionError::VersionOverflow {
                event_type: "REVISED".into(),
                version: u32::MAX,
            }
        );

        let scheduled = process(
            &registry,
            Some(&exhausted),
            "SCHEDULED",
            &payload! { "deadline" => Utc::now() },
        )
        .unwrap();
        assert_eq!(scheduled.version, u32::MAX);
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let registry = task_registry();

        assert!(matches!(
            process(&registry, None, "PAUSED", &payload!()),
            Err(TransitionError::UnknownEventType { name, .. }) if name == "PAUSED"
        ));
    }
}
