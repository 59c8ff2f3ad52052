//! Race-safe insert over the store's unique index.

use super::error::AppendError;
use crate::core::{Event, NewEvent};
use crate::store::EventStore;
use tracing::{debug, warn};

/// Insert `event` unless its index key is taken, then return the canonical row.
///
/// The row re-read after the insert attempt is canonical whether this
/// writer won the race or not. If it is not the same logical transition as
/// `event` (same event type, parent and container), two different
/// transitions collided and the call fails with
/// [`AppendError::ConcurrentStateConflict`].
pub fn upsert_on_index_elements<S: EventStore + ?Sized>(
    store: &S,
    event: NewEvent,
) -> Result<Event, AppendError> {
    let index = store.upsert_index_elements();
    let inserted = store.insert_if_absent(event.clone(), &index)?;
    let won = inserted.is_some();
    let canonical = store
        .retrieve_most_recent_matching(&index, &event)?
        .or(inserted);

    match canonical {
        Some(row) if row.is_similar_to(&event) => {
            if !won {
                debug!(
                    container_id = %row.container_id,
                    event_type = %row.event_type,
                    clock = row.clock,
                    "Reusing equivalent event from concurrent writer"
                );
            }
            Ok(row)
        }
        row => {
            warn!(
                container_id = %event.container_id,
                event_type = %event.event_type,
                index = %index.name(),
                "Concurrent state conflict"
            );
            Err(AppendError::ConcurrentStateConflict {
                container_id: event.container_id,
                attempted: event.event_type,
                existing: row.map(|row| row.event_type),
                index: index.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::State;
    use crate::payload;
    use crate::registry::fixtures::task_registry;
    use crate::store::{EventFilter, IndexElement, IndexElements, InMemoryEventStore};
    use uuid::Uuid;

    fn candidate(event_type: &str, parent: &Event) -> NewEvent {
        NewEvent {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            parent_id: Some(parent.id),
            container_id: parent.container_id,
            state: parent.state.with(event_type),
            version: parent.version,
            payload: payload! {
                "assignee" => "Alice",
                "deadline" => "2026-11-01",
            },
        }
    }

    fn created(store: &InMemoryEventStore) -> Event {
        store
            .create(NewEvent {
                id: Uuid::new_v4(),
                event_type: "CREATED".into(),
                parent_id: None,
                container_id: Uuid::new_v4(),
                state: State::singleton("CREATED"),
                version: 1,
                payload: payload!(),
            })
            .unwrap()
    }

    #[test]
    fn winner_gets_its_own_row() {
        let store = InMemoryEventStore::for_registry(&task_registry(), "task_event");
        let parent = created(&store);
        let attempt = candidate("ASSIGNED", &parent);

        let row = upsert_on_index_elements(&store, attempt.clone()).unwrap();

        assert_eq!(row.id, attempt.id);
        assert_eq!(row.clock, 2);
    }

    #[test]
    fn equivalent_loser_gets_the_winners_row() {
        let store = InMemoryEventStore::for_registry(&task_registry(), "task_event");
        let parent = created(&store);

        let first = upsert_on_index_elements(&store, candidate("ASSIGNED", &parent)).unwrap();
        let second = upsert_on_index_elements(&store, candidate("ASSIGNED", &parent)).unwrap();

        assert_eq!(first, second);
        let children = store
            .search(&EventFilter::new().parent_id(parent.id))
            .unwrap();
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn different_transition_on_same_parent_conflicts() {
        let store = InMemoryEventStore::for_registry(&task_registry(), "task_event");
        let parent = created(&store);
        upsert_on_index_elements(&store, candidate("ASSIGNED", &parent)).unwrap();

        let error = upsert_on_index_elements(&store, candidate("SCHEDULED", &parent)).unwrap_err();

        assert_eq!(
            error,
            AppendError::ConcurrentStateConflict {
                container_id: parent.container_id,
                attempted: "SCHEDULED".into(),
                existing: Some("ASSIGNED".into()),
                index: "unique_parent_id".into(),
            }
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn custom_index_elements_are_respected() {
        let index = IndexElements::new([
            IndexElement::ContainerId,
            IndexElement::EventType,
            IndexElement::Version,
        ]);
        let store = InMemoryEventStore::for_registry(&task_registry(), "task_event")
            .with_index_elements(index);
        let parent = created(&store);

        let assigned = upsert_on_index_elements(&store, candidate("ASSIGNED", &parent)).unwrap();
        let scheduled =
            upsert_on_index_elements(&store, candidate("SCHEDULED", &assigned)).unwrap();

        assert_eq!(scheduled.parent_id, Some(assigned.id));
        assert_eq!(store.len(), 3);
    }
}
