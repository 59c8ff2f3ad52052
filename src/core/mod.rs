//! Core event-sourcing types and logic.
//!
//! This module contains the pure functional core of the engine:
//! - The transition grammar deciding whether an event type may follow a state
//! - Accumulation strategies computing the next state
//! - Event type metadata and payload values
//! - Event rows and clock-ordered event chains
//!
//! Nothing in this module performs I/O.

mod accumulate;
mod event;
mod event_type;
mod grammar;
mod payload;
mod state;

pub use accumulate::{addition, alias, compose, current, difference, keep, union, Accumulate};
pub use event::{Event, EventChain, NewEvent, StateSummary};
pub use event_type::{event_info, EventType, EventTypeInfo};
pub use grammar::{all_of, any_of, but_not, event, nothing, Follows};
pub use payload::{has_value, FieldValue, Payload};
pub use state::State;
