//! The append pipeline.
//!
//! [`EventFactory`] ties the pieces together: it reads the parent (optionally
//! under a `NOWAIT` container lock), runs the pure transition processor,
//! persists with [`upsert_on_index_elements`], updates container records,
//! publishes notifications, and then follows auto-transitions.

pub mod config;
pub mod error;
mod factory;
pub mod mutator;
pub mod publish;
mod upsert;

pub use config::FactoryConfig;
pub use error::AppendError;
pub use factory::{AppendOutcome, AppendRequest, EventFactory};
pub use mutator::{ContainerMutators, ContainerMutatorsBuilder, ContainerStore, ContainerUpdater};
pub use publish::{Notification, NoopPublisher, PublishError, Publisher, RecordingPublisher};
pub use upsert::upsert_on_index_elements;
