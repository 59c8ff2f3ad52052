//! Task lifecycle fixtures shared by the integration tests.

#![allow(dead_code)]

use eventsource::append::{EventFactory, FactoryConfig, RecordingPublisher};
use eventsource::core::{
    alias, all_of, any_of, but_not, current, event, event_info, keep, nothing, union, Payload,
};
use eventsource::payload;
use eventsource::registry::EventTypeRegistry;
use eventsource::store::{EventStore, InMemoryEventStore};
use std::sync::Arc;

pub fn task_registry() -> EventTypeRegistry {
    EventTypeRegistry::builder("task")
        .event_type(event_info("CREATED").follows(nothing()).accumulate(current()))
        .event_type(
            event_info("ASSIGNED")
                .follows(all_of(["CREATED".into(), but_not("ASSIGNED")]))
                .accumulate(union())
                .requires(["assignee"]),
        )
        .event_type(
            event_info("SCHEDULED")
                .follows(all_of(["CREATED".into(), but_not("SCHEDULED")]))
                .accumulate(union())
                .requires(["deadline"]),
        )
        .event_type(
            event_info("STARTED")
                .follows(all_of(["ASSIGNED", "SCHEDULED"]))
                .accumulate(current()),
        )
        .event_type(event_info("CANCELED").follows(event("STARTED")).accumulate(current()))
        .event_type(event_info("COMPLETED").follows(event("STARTED")).accumulate(current()))
        .event_type(
            event_info("ENDED")
                .follows(event("COMPLETED"))
                .accumulate(current())
                .auto_transition(),
        )
        .event_type(
            event_info("REASSIGNED")
                .follows(event("STARTED"))
                .accumulate(keep())
                .requires(["assignee"]),
        )
        .event_type(
            event_info("REVISED")
                .follows(any_of(["CREATED", "STARTED"]))
                .accumulate(alias("CREATED"))
                .restarting(),
        )
        .build()
        .expect("task registry is well formed")
}

pub fn task_config() -> FactoryConfig {
    FactoryConfig::new("task_event").resource_base_uri("http://localhost/api/v1/task_event")
}

pub fn task_factory<S: EventStore>(
    store: Arc<S>,
) -> (EventFactory<S, RecordingPublisher>, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::new());
    let factory = EventFactory::new(Arc::new(task_registry()), store, Arc::clone(&publisher))
        .expect("task registry has unambiguous auto-transitions")
        .with_config(task_config());
    (factory, publisher)
}

pub fn task_store() -> Arc<InMemoryEventStore> {
    Arc::new(InMemoryEventStore::for_registry(&task_registry(), "task_event"))
}

pub fn assignment() -> Payload {
    payload! { "assignee" => "Alice" }
}

pub fn schedule() -> Payload {
    payload! { "deadline" => "2026-11-01T00:00:00Z" }
}
