//! Task Lifecycle
//!
//! This example walks a task through its whole lifecycle with the event factory.
//!
//! Key concepts:
//! - Declaring event types with the follows grammar and accumulation strategies
//! - Validating the registry's state space before serving requests
//! - Batched required-field errors and illegal transitions
//! - The auto-transition cascade (COMPLETED -> ENDED)
//! - Notifications and read-side rollups
//!
//! Run with: cargo run --example task_lifecycle

use eventsource::append::{AppendRequest, EventFactory, FactoryConfig, RecordingPublisher};
use eventsource::core::{all_of, alias, any_of, but_not, current, event, event_info, union};
use eventsource::payload;
use eventsource::registry::EventTypeRegistry;
use eventsource::store::{InMemoryEventStore, RollUpStore};
use std::sync::Arc;
use uuid::Uuid;

fn task_registry() -> EventTypeRegistry {
    EventTypeRegistry::builder("task")
        .event_type(event_info("CREATED").accumulate(current()))
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
        .event_type(event_info("COMPLETED").follows(event("STARTED")).accumulate(current()))
        .event_type(
            event_info("ENDED")
                .follows(event("COMPLETED"))
                .accumulate(current())
                .auto_transition(),
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

fn main() {
    println!("=== Task Lifecycle Example ===\n");

    let registry = Arc::new(task_registry());
    println!("Reachable states:");
    for state in registry.all_states() {
        let next: Vec<&str> = registry
            .available_transitions(&state)
            .iter()
            .map(|event_type| event_type.name())
            .collect();
        println!("  {state} -> {next:?}");
    }
    println!();

    let store = Arc::new(InMemoryEventStore::for_registry(&registry, "task_event"));
    let publisher = Arc::new(RecordingPublisher::new());
    let config =
        FactoryConfig::new("task_event").resource_base_uri("http://localhost/api/v1/task_event");
    let factory = EventFactory::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        Arc::clone(&publisher),
    )
    .expect("auto-transitions are unambiguous")
    .with_config(config);

    let task_id = Uuid::new_v4();
    println!("Task {task_id}");
    println!("----------------------------------------");

    let requests = [
        AppendRequest::new(task_id, "CREATED"),
        AppendRequest::new(task_id, "ASSIGNED"),
        AppendRequest::new(task_id, "ASSIGNED").payload(payload! { "assignee" => "Alice" }),
        AppendRequest::new(task_id, "STARTED"),
        AppendRequest::new(task_id, "SCHEDULED")
            .payload(payload! { "deadline" => "2026-11-01T00:00:00Z" }),
        AppendRequest::new(task_id, "STARTED"),
        AppendRequest::new(task_id, "COMPLETED"),
    ];

    for request in requests {
        let event_type = request.event_type.clone();
        match factory.create(request) {
            Ok(outcome) => {
                for event in outcome.events() {
                    println!(
                        "  [{}] {:<10} state={} version={}",
                        event.clock, event.event_type, event.state, event.version
                    );
                }
            }
            Err(error) => {
                println!("  rejected {event_type}: {error} (status {})", error.status_code());
            }
        }
    }

    println!("\nNotifications:");
    for notification in publisher.notifications() {
        println!("  {} {}", notification.media_type, notification.resource_uri);
    }

    let rollups = RollUpStore::new(Arc::clone(&store));
    if let Ok(Some(rollup)) = rollups.retrieve(task_id) {
        let summary = rollup.summary();
        println!(
            "\nRollup: {} events, latest {} at clock {}, assignee {:?}",
            rollup.event_count,
            summary.event_type,
            summary.clock,
            rollup.fields.get("assignee").and_then(|value| value.as_text())
        );
    }

    println!("\nKey Takeaways:");
    println!("- The grammar decides legality from the accumulated state, not the last event");
    println!("- Missing fields are reported together and nothing is persisted");
    println!("- Auto-transitions append themselves after the event that enables them");

    println!("\n=== Example Complete ===");
}
