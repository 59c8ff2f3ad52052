//! Checkpoint and Resume
//!
//! This example moves a task's event chain from one store to another and keeps appending.
//!
//! Key concepts:
//! - Capturing a container's chain as a versioned checkpoint
//! - Serialization formats (JSON for readability, binary for compactness)
//! - Verifying a chain against the registry before it is restored
//! - Restores are all or nothing
//!
//! Run with: cargo run --example checkpoint_resume

use eventsource::append::{AppendRequest, EventFactory, NoopPublisher};
use eventsource::checkpoint::ChainCheckpoint;
use eventsource::core::{all_of, but_not, current, event, event_info, union, State};
use eventsource::payload;
use eventsource::registry::EventTypeRegistry;
use eventsource::store::{EventStore, InMemoryEventStore};
use std::fs;
use std::sync::Arc;
use uuid::Uuid;

const CHECKPOINT_DIR: &str = "/tmp/eventsource-checkpoints";

fn review_registry() -> EventTypeRegistry {
    EventTypeRegistry::builder("review")
        .event_type(event_info("DRAFTED").accumulate(current()))
        .event_type(
            event_info("SUBMITTED")
                .follows(event("DRAFTED"))
                .accumulate(current())
                .requires(["reviewer"]),
        )
        .event_type(
            event_info("APPROVED")
                .follows(all_of(["SUBMITTED".into(), but_not("APPROVED")]))
                .accumulate(union()),
        )
        .event_type(
            event_info("PUBLISHED")
                .follows(all_of(["SUBMITTED", "APPROVED"]))
                .accumulate(current())
                .auto_transition(),
        )
        .build()
        .expect("review registry is well formed")
}

fn factory(
    registry: &Arc<EventTypeRegistry>,
    store: &Arc<InMemoryEventStore>,
) -> EventFactory<InMemoryEventStore, NoopPublisher> {
    EventFactory::new(Arc::clone(registry), Arc::clone(store), Arc::new(NoopPublisher))
        .expect("auto-transitions are unambiguous")
}

fn main() {
    println!("=== Checkpoint and Resume Example ===\n");

    let registry = Arc::new(review_registry());
    let source = Arc::new(InMemoryEventStore::for_registry(&registry, "review_event"));
    let review_id = Uuid::new_v4();

    // Run 1: record part of the lifecycle
    println!("Run 1: recording events");
    println!("----------------------------------------");
    let writer = factory(&registry, &source);
    writer
        .create(AppendRequest::new(review_id, "DRAFTED"))
        .expect("first event");
    let submitted =
        AppendRequest::new(review_id, "SUBMITTED").payload(payload! { "reviewer" => "Dana" });
    writer.create(submitted).expect("submitted");

    let checkpoint = ChainCheckpoint::capture(&registry, source.as_ref(), review_id)
        .expect("chain can be captured");
    for event in checkpoint.chain.events() {
        println!("  [{}] {} state={}", event.clock, event.event_type, event.state);
    }

    fs::create_dir_all(CHECKPOINT_DIR).ok();
    let json_path = format!("{CHECKPOINT_DIR}/{review_id}.json");
    let binary_path = format!("{CHECKPOINT_DIR}/{review_id}.bin");
    let json = checkpoint.to_json().expect("json encoding");
    let binary = checkpoint.to_binary().expect("binary encoding");
    fs::write(&json_path, &json).ok();
    fs::write(&binary_path, &binary).ok();
    println!(
        "  [Checkpoint] {} bytes as JSON, {} bytes as binary",
        json.len(),
        binary.len()
    );

    // Run 2: restore into a fresh store and continue
    println!("\nRun 2: resuming from checkpoint");
    println!("----------------------------------------");
    let restored = fs::read(&binary_path)
        .ok()
        .and_then(|bytes| ChainCheckpoint::from_binary(&bytes).ok())
        .unwrap_or(checkpoint);

    let target = Arc::new(InMemoryEventStore::for_registry(&registry, "review_event"));
    match restored.restore(&registry, &target) {
        Ok(count) => println!("  restored {count} events"),
        Err(error) => println!("  restore failed: {error}"),
    }
    if let Err(error) = restored.restore(&registry, &target) {
        println!("  restoring twice is refused: {error}");
    }

    let resumed = factory(&registry, &target);
    match resumed.create(AppendRequest::new(review_id, "APPROVED")) {
        Ok(outcome) => {
            for event in outcome.events() {
                println!("  [{}] {} state={}", event.clock, event.event_type, event.state);
            }
        }
        Err(error) => println!("  append failed: {error}"),
    }

    let head = target.retrieve_most_recent(review_id).ok().flatten();
    let published = head.map(|event| event.state) == Some(State::singleton("PUBLISHED"));
    println!("  published after resume: {published}");

    fs::remove_dir_all(CHECKPOINT_DIR).ok();

    println!("\nKey Takeaways:");
    println!("- Checkpoints carry ids and clocks, so appends continue where they left off");
    println!("- Every restored event is re-processed against the registry first");
    println!("- A restore that would violate a store constraint writes nothing");

    println!("\n=== Example Complete ===");
}
