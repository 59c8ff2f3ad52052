//! The event factory: the full append pipeline for one entity kind.

use super::config::FactoryConfig;
use super::error::AppendError;
use super::mutator::ContainerUpdater;
use super::publish::Publisher;
use super::upsert::upsert_on_index_elements;
use crate::core::{Event, NewEvent, Payload, StateSummary};
use crate::registry::{EventTypeRegistry, RegistryError};
use crate::store::{ContainerLock, EventStore};
use crate::transition::process;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A request to append one event to a container.
#[derive(Clone, Debug, PartialEq)]
pub struct AppendRequest {
    pub container_id: Uuid,
    pub event_type: String,
    pub payload: Payload,
    /// Take the container lock (`NOWAIT`) before reading the parent.
    pub lock: bool,
    pub skip_publish: bool,
    /// Pin the version instead of computing it.
    pub version: Option<u32>,
}

impl AppendRequest {
    pub fn new(container_id: Uuid, event_type: impl Into<String>) -> Self {
        Self {
            container_id,
            event_type: event_type.into(),
            payload: Payload::new(),
            lock: false,
            skip_publish: false,
            version: None,
        }
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_lock(mut self) -> Self {
        self.lock = true;
        self
    }

    pub fn skip_publish(mut self) -> Self {
        self.skip_publish = true;
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }
}

/// Result of a successful append.
///
/// The requested event is committed even when the cascade fails; the
/// cascade failure is reported in `cascade_error`.
#[derive(Debug)]
pub struct AppendOutcome {
    pub event: Event,
    /// Auto-transition events appended after `event`, in order.
    pub cascade: Vec<Event>,
    pub cascade_error: Option<AppendError>,
}

impl AppendOutcome {
    /// The container's most recent event after this append.
    pub fn latest(&self) -> &Event {
        self.cascade.last().unwrap_or(&self.event)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        std::iter::once(&self.event).chain(self.cascade.iter())
    }
}

/// Appends events for one entity kind.
///
/// Runs the pure transition processor, persists with the race-safe upsert
/// (or a plain insert for first events), mirrors the event onto the
/// container, publishes notifications and then follows auto-transitions.
///
/// # Example
///
/// ```rust
/// use eventsource::append::{AppendRequest, EventFactory, RecordingPublisher};
/// use eventsource::core::{current, event_info, State};
/// use eventsource::registry::EventTypeRegistry;
/// use eventsource::store::InMemoryEventStore;
/// use std::sync::Arc;
/// use uuid::Uuid;
///
/// let registry = Arc::new(
///     EventTypeRegistry::builder("order")
///         .event_type(event_info("PLACED").accumulate(current()))
///         .event_type(event_info("PAID").follows("PLACED").accumulate(current()))
///         .event_type(
///             event_info("FULFILLED")
///                 .follows("PAID")
///                 .accumulate(current())
///                 .auto_transition(),
///         )
///         .build()
///         .unwrap(),
/// );
/// let store = Arc::new(InMemoryEventStore::for_registry(&registry, "order_event"));
/// let factory =
///     EventFactory::new(registry, store, Arc::new(RecordingPublisher::new())).unwrap();
///
/// let order_id = Uuid::new_v4();
/// factory.create(AppendRequest::new(order_id, "PLACED")).unwrap();
/// let outcome = factory.create(AppendRequest::new(order_id, "PAID")).unwrap();
///
/// assert_eq!(outcome.cascade.len(), 1);
/// assert_eq!(outcome.latest().state, State::singleton("FULFILLED"));
/// ```
pub struct EventFactory<S: EventStore, P: Publisher> {
    registry: Arc<EventTypeRegistry>,
    store: Arc<S>,
    publisher: Arc<P>,
    config: FactoryConfig,
    containers: Option<Arc<dyn ContainerUpdater>>,
}

impl<S: EventStore, P: Publisher> EventFactory<S, P> {
    /// Fails when the registry has ambiguous auto-transitions.
    pub fn new(
        registry: Arc<EventTypeRegistry>,
        store: Arc<S>,
        publisher: Arc<P>,
    ) -> Result<Self, RegistryError> {
        registry.validate_transitions()?;
        Ok(Self {
            registry,
            store,
            publisher,
            config: FactoryConfig::default(),
            containers: None,
        })
    }

    pub fn with_config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_container_updater(mut self, containers: Arc<dyn ContainerUpdater>) -> Self {
        self.containers = Some(containers);
        self
    }

    pub fn registry(&self) -> &EventTypeRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// State summary of a container's most recent event.
    pub fn state_summary(&self, container_id: Uuid) -> Result<Option<StateSummary>, AppendError> {
        Ok(self
            .store
            .retrieve_most_recent(container_id)?
            .map(|event| event.summary()))
    }

    /// Append the requested event, then any auto-transitions it enables.
    pub fn create(&self, request: AppendRequest) -> Result<AppendOutcome, AppendError> {
        let (parent, lock) = if request.lock {
            let locked = self
                .store
                .retrieve_most_recent_with_lock(request.container_id)
                .map_err(AppendError::from_lock)?;
            (locked.event, locked.lock)
        } else {
            (
                self.store.retrieve_most_recent(request.container_id)?,
                ContainerLock::unlocked(request.container_id),
            )
        };

        let event = self.append(parent.as_ref(), &request.event_type, &request, request.version)?;
        let (cascade, cascade_error) = self.cascade(&event, &request);
        drop(lock);

        Ok(AppendOutcome {
            event,
            cascade,
            cascade_error,
        })
    }

    fn append(
        &self,
        parent: Option<&Event>,
        event_type: &str,
        request: &AppendRequest,
        version: Option<u32>,
    ) -> Result<Event, AppendError> {
        let transition = process(&self.registry, parent, event_type, &request.payload)?;
        let candidate = NewEvent {
            id: Uuid::new_v4(),
            event_type: transition.event_type,
            parent_id: parent.map(|event| event.id),
            container_id: request.container_id,
            state: transition.state,
            version: version.unwrap_or(transition.version),
            payload: request.payload.clone(),
        };

        let event = match parent {
            None => self.store.create(candidate)?,
            Some(_) => upsert_on_index_elements(self.store.as_ref(), candidate)?,
        };
        debug!(
            container_id = %event.container_id,
            event_type = %event.event_type,
            clock = event.clock,
            version = event.version,
            state = %event.state,
            "Appended event"
        );

        if let Some(containers) = &self.containers {
            containers.on_event(&event);
        }
        if !request.skip_publish {
            self.publish(&event);
        }
        Ok(event)
    }

    fn cascade(&self, event: &Event, request: &AppendRequest) -> (Vec<Event>, Option<AppendError>) {
        let mut cascaded = Vec::new();
        if !self.config.auto_transition {
            return (cascaded, None);
        }

        let mut parent = event.clone();
        loop {
            let automatic: Vec<&str> = self
                .registry
                .available_transitions(&parent.state)
                .into_iter()
                .filter(|event_type| event_type.is_auto_transition())
                .map(|event_type| event_type.name())
                .collect();

            let next = match automatic.as_slice() {
                [] => break,
                [only] => *only,
                _ => {
                    warn!(
                        container_id = %parent.container_id,
                        state = %parent.state,
                        candidates = ?automatic,
                        "Skipping ambiguous auto-transition"
                    );
                    break;
                }
            };

            info!(
                container_id = %parent.container_id,
                event_type = %next,
                parent_event_type = %parent.event_type,
                "Auto-transition"
            );
            match self.append(Some(&parent), next, request, None) {
                Ok(event) => {
                    cascaded.push(event.clone());
                    parent = event;
                }
                Err(error) => {
                    warn!(
                        container_id = %parent.container_id,
                        event_type = %next,
                        %error,
                        "Auto-transition failed"
                    );
                    return (cascaded, Some(error));
                }
            }
        }

        (cascaded, None)
    }

    fn publish(&self, event: &Event) {
        let resource_uri = self.config.resource_uri(event.id);
        for media_type in self.config.media_types(&event.event_type) {
            if let Err(error) = self.publisher.publish(&media_type, &resource_uri) {
                warn!(
                    event_id = %event.id,
                    media_type = %media_type,
                    %error,
                    "Failed to publish event notification"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::append::{ContainerMutators, ContainerStore, RecordingPublisher};
    use crate::core::{current, event_info, State};
    use crate::payload;
    use crate::registry::fixtures::{illegal_registry, task_registry};
    use crate::store::InMemoryEventStore;
    use crate::transition::TransitionError;

    type TaskFactory = EventFactory<InMemoryEventStore, RecordingPublisher>;

    fn factory() -> (TaskFactory, Arc<RecordingPublisher>) {
        let registry = Arc::new(task_registry());
        let store = Arc::new(InMemoryEventStore::for_registry(&registry, "task_event"));
        let publisher = Arc::new(RecordingPublisher::new());
        let factory = EventFactory::new(registry, store, Arc::clone(&publisher))
            .unwrap()
            .with_config(
                FactoryConfig::new("task_event").resource_base_uri("http://localhost/task_event"),
            );
        (factory, publisher)
    }

    fn full_payload() -> Payload {
        payload! {
            "assignee" => "Alice",
            "deadline" => "2026-11-01",
        }
    }

    fn append(factory: &TaskFactory, container_id: Uuid, event_type: &str) -> AppendOutcome {
        factory
            .create(AppendRequest::new(container_id, event_type).payload(full_payload()))
            .unwrap()
    }

    #[test]
    fn illegal_registry_is_rejected_at_startup() {
        let registry = Arc::new(illegal_registry());
        let store = Arc::new(InMemoryEventStore::new());

        let result = EventFactory::new(registry, store, Arc::new(RecordingPublisher::new()));
        assert!(matches!(
            result,
            Err(RegistryError::InvalidAutoTransitions { .. })
        ));
    }

    #[test]
    fn first_event_has_no_parent() {
        let (factory, publisher) = factory();
        let container_id = Uuid::new_v4();

        let outcome = append(&factory, container_id, "CREATED");

        assert_eq!(outcome.event.parent_id, None);
        assert_eq!(outcome.event.clock, 1);
        assert!(outcome.cascade.is_empty());
        assert_eq!(
            publisher.notifications()[0].resource_uri,
            format!("http://localhost/task_event/{}", outcome.event.id)
        );
    }

    #[test]
    fn completion_cascades_to_ended() {
        let (factory, publisher) = factory();
        let container_id = Uuid::new_v4();
        for event_type in ["CREATED", "ASSIGNED", "SCHEDULED", "STARTED"] {
            append(&factory, container_id, event_type);
        }

        let outcome = append(&factory, container_id, "COMPLETED");

        assert_eq!(outcome.cascade.len(), 1);
        assert!(outcome.cascade_error.is_none());
        let ended = outcome.latest();
        assert_eq!(ended.event_type, "ENDED");
        assert_eq!(ended.parent_id, Some(outcome.event.id));
        assert_eq!(ended.state, State::singleton("ENDED"));
        assert_eq!(ended.version, outcome.event.version);
        assert_eq!(
            publisher.media_types()[4..].to_vec(),
            vec![
                "application/vnd.eventsource.created.task_event.completed".to_string(),
                "application/vnd.eventsource.created.task_event.ended".to_string(),
            ]
        );
        assert_eq!(
            factory.state_summary(container_id).unwrap().unwrap().event_type,
            "ENDED"
        );
    }

    #[test]
    fn cascade_can_be_disabled() {
        let (factory, _) = factory();
        let factory = factory.with_config(FactoryConfig::default().auto_transition(false));
        let container_id = Uuid::new_v4();
        for event_type in ["CREATED", "ASSIGNED", "SCHEDULED", "STARTED"] {
            append(&factory, container_id, event_type);
        }

        let outcome = append(&factory, container_id, "COMPLETED");
        assert!(outcome.cascade.is_empty());
        assert_eq!(outcome.latest().event_type, "COMPLETED");
    }

    #[test]
    fn missing_field_persists_nothing() {
        let (factory, publisher) = factory();
        let container_id = Uuid::new_v4();
        append(&factory, container_id, "CREATED");

        let error = factory
            .create(AppendRequest::new(container_id, "ASSIGNED"))
            .unwrap_err();

        assert!(matches!(
            &error,
            AppendError::Transition(TransitionError::MissingRequiredField { fields })
                if fields[0].field == "assignee"
        ));
        assert_eq!(error.status_code(), 422);
        assert_eq!(factory.store().len(), 1);
        assert_eq!(publisher.notifications().len(), 1);
    }

    #[test]
    fn locked_append_fails_fast_when_busy() {
        let (factory, _) = factory();
        let container_id = Uuid::new_v4();
        append(&factory, container_id, "CREATED");

        let held = factory.store().lock_container(container_id).unwrap();
        let error = factory
            .create(
                AppendRequest::new(container_id, "ASSIGNED")
                    .payload(full_payload())
                    .with_lock(),
            )
            .unwrap_err();
        assert_eq!(error, AppendError::ContainerLockUnavailable { container_id });
        assert!(error.is_retryable());

        drop(held);
        let outcome = factory
            .create(
                AppendRequest::new(container_id, "ASSIGNED")
                    .payload(full_payload())
                    .with_lock(),
            )
            .unwrap();
        assert_eq!(outcome.event.clock, 2);
        assert!(!factory.store().is_locked(container_id));
    }

    #[test]
    fn publish_failure_does_not_fail_append() {
        let (factory, publisher) = factory();
        publisher.fail_with("broker down");

        let outcome = append(&factory, Uuid::new_v4(), "CREATED");
        assert_eq!(outcome.event.event_type, "CREATED");
        assert!(publisher.notifications().is_empty());
    }

    #[test]
    fn skip_publish_suppresses_notifications() {
        let (factory, publisher) = factory();
        factory
            .create(AppendRequest::new(Uuid::new_v4(), "CREATED").skip_publish())
            .unwrap();

        assert!(publisher.notifications().is_empty());
    }

    #[test]
    fn explicit_version_overrides_computed_version() {
        let (factory, _) = factory();
        let container_id = Uuid::new_v4();
        append(&factory, container_id, "CREATED");

        let outcome = factory
            .create(
                AppendRequest::new(container_id, "ASSIGNED")
                    .payload(full_payload())
                    .version(3),
            )
            .unwrap();
        assert_eq!(outcome.event.version, 3);
    }

    #[test]
    fn cascade_failure_keeps_requested_event() {
        let registry = Arc::new(
            EventTypeRegistry::builder("approval")
                .event_type(event_info("SUBMITTED").accumulate(current()))
                .event_type(
                    event_info("APPROVED")
                        .follows("SUBMITTED")
                        .accumulate(current())
                        .requires(["approver"])
                        .auto_transition(),
                )
                .build()
                .unwrap(),
        );
        let store = Arc::new(InMemoryEventStore::for_registry(&registry, "approval_event"));
        let factory =
            EventFactory::new(registry, store, Arc::new(RecordingPublisher::new())).unwrap();
        let container_id = Uuid::new_v4();

        let outcome = factory
            .create(AppendRequest::new(container_id, "SUBMITTED"))
            .unwrap();

        assert!(outcome.cascade.is_empty());
        assert!(matches!(
            outcome.cascade_error,
            Some(AppendError::Transition(TransitionError::MissingRequiredField { .. }))
        ));
        assert_eq!(
            factory.store().retrieve_most_recent(container_id).unwrap(),
            Some(outcome.event)
        );
    }

    #[test]
    fn container_mutators_see_cascaded_events() {
        #[derive(Clone, Debug, Default)]
        struct Task {
            last_event_type: Option<String>,
            ended: bool,
        }

        let mutators = ContainerMutators::builder()
            .common(|task: &mut Task, event| task.last_event_type = Some(event.event_type.clone()))
            .on("ENDED", |task: &mut Task, _| task.ended = true)
            .build()
            .unwrap();
        let containers = Arc::new(ContainerStore::new(mutators));
        let (factory, _) = factory();
        let factory = factory.with_container_updater(containers.clone());
        let container_id = Uuid::new_v4();

        for event_type in ["CREATED", "ASSIGNED", "SCHEDULED", "STARTED", "COMPLETED"] {
            append(&factory, container_id, event_type);
        }

        let task = containers.get(container_id).unwrap();
        assert!(task.ended);
        assert_eq!(task.last_event_type.as_deref(), Some("ENDED"));
    }
}
