//! Transition processing.
//!
//! The processor is the pure decision step of an append: it validates the
//! payload, enforces the transition grammar and computes the next state and
//! version. Storage and concurrency live in [`crate::append`].

pub mod error;
mod fields;
mod processor;

pub use error::{MissingField, TransitionError};
pub use fields::{missing_required_fields, validate_required_fields};
pub use processor::{check_legal, process, Transition};

pub(crate) use processor::lookup;
