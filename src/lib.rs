//! Eventsource: event-sourced state machines
//!
//! An entity's lifecycle is recorded as an append-only chain of immutable
//! events. Each event type declares, in a small grammar, which accumulated
//! states it may follow, how it changes that state, which payload fields it
//! requires, and whether it starts a new version or fires automatically.
//!
//! The decision logic is a pure core with no I/O; storage, locking and
//! notifications sit in an imperative shell around it.
//!
//! # Core Concepts
//!
//! - **State**: the set of event types that characterize "where" a container is
//! - **Grammar**: `follows` expressions deciding whether an event type may be appended
//! - **Accumulation**: how the next state is derived from the previous one
//! - **Registry**: the closed set of event types for one entity kind, with a
//!   state-space analyzer that rejects ambiguous auto-transitions
//! - **Append protocol**: race-safe persistence with an optional `NOWAIT` lock,
//!   followed by the auto-transition cascade
//!
//! # Example
//!
//! ```rust
//! use eventsource::append::{AppendRequest, EventFactory, RecordingPublisher};
//! use eventsource::core::{all_of, but_not, current, event_info, union, State};
//! use eventsource::payload;
//! use eventsource::registry::EventTypeRegistry;
//! use eventsource::store::InMemoryEventStore;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! let registry = Arc::new(
//!     EventTypeRegistry::builder("task")
//!         .event_type(event_info("CREATED").accumulate(current()))
//!         .event_type(
//!             event_info("ASSIGNED")
//!                 .follows(all_of(["CREATED".into(), but_not("ASSIGNED")]))
//!                 .accumulate(union())
//!                 .requires(["assignee"]),
//!         )
//!         .build()
//!         .unwrap(),
//! );
//! let store = Arc::new(InMemoryEventStore::for_registry(&registry, "task_event"));
//! let factory = EventFactory::new(registry, store, Arc::new(RecordingPublisher::new())).unwrap();
//!
//! let task_id = Uuid::new_v4();
//! factory.create(AppendRequest::new(task_id, "CREATED")).unwrap();
//! let outcome = factory
//!     .create(AppendRequest::new(task_id, "ASSIGNED").payload(payload! { "assignee" => "Alice" }))
//!     .unwrap();
//!
//! let expected: State = ["CREATED", "ASSIGNED"].into_iter().collect();
//! assert_eq!(outcome.event.state, expected);
//! ```

#[macro_use]
mod macros;

pub mod append;
pub mod checkpoint;
pub mod core;
pub mod registry;
pub mod store;
pub mod transition;

pub use append::{AppendError, AppendOutcome, AppendRequest, EventFactory, FactoryConfig};
pub use crate::core::{Event, EventType, State};
pub use registry::{EventTypeRegistry, RegistryBuilder, RegistryError};
pub use store::{EventStore, InMemoryEventStore, StoreError};
pub use transition::{process, TransitionError};
