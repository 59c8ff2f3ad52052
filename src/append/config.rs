//! Event factory configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Media type prefix for creation notifications.
pub const CREATED_MEDIA_TYPE_PREFIX: &str = "application/vnd.eventsource.created";

/// Settings for an [`EventFactory`](super::EventFactory).
///
/// # Example
///
/// ```rust
/// use eventsource::append::FactoryConfig;
///
/// let config = FactoryConfig::new("task_event")
///     .resource_base_uri("http://localhost/api/v1/task_event")
///     .publish_model_pubsub(true);
///
/// assert_eq!(
///     config.event_media_type("ASSIGNED"),
///     "application/vnd.eventsource.created.task_event.assigned"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Model name used in notification media types.
    pub model_name: String,
    /// Prefix of created events' resource URIs.
    pub resource_base_uri: String,
    /// Publish `created.<model>.<event_type>` for each event.
    pub publish_event_pubsub: bool,
    /// Also publish `created.<model>` for each event.
    pub publish_model_pubsub: bool,
    /// Append auto-transition events after each successful append.
    pub auto_transition: bool,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            model_name: "event".to_string(),
            resource_base_uri: String::new(),
            publish_event_pubsub: true,
            publish_model_pubsub: false,
            auto_transition: true,
        }
    }
}

impl FactoryConfig {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    pub fn resource_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.resource_base_uri = uri.into();
        self
    }

    pub fn publish_event_pubsub(mut self, enabled: bool) -> Self {
        self.publish_event_pubsub = enabled;
        self
    }

    pub fn publish_model_pubsub(mut self, enabled: bool) -> Self {
        self.publish_model_pubsub = enabled;
        self
    }

    pub fn auto_transition(mut self, enabled: bool) -> Self {
        self.auto_transition = enabled;
        self
    }

    pub fn event_media_type(&self, event_type: &str) -> String {
        format!(
            "{CREATED_MEDIA_TYPE_PREFIX}.{}.{}",
            self.model_name,
            event_type.to_lowercase()
        )
    }

    pub fn model_media_type(&self) -> String {
        format!("{CREATED_MEDIA_TYPE_PREFIX}.{}", self.model_name)
    }

    pub fn resource_uri(&self, id: Uuid) -> String {
        format!("{}/{id}", self.resource_base_uri.trim_end_matches('/'))
    }

    /// Media types to publish for one event, per the publication flags.
    pub fn media_types(&self, event_type: &str) -> Vec<String> {
        let mut media_types = Vec::new();
        if self.publish_event_pubsub {
            media_types.push(self.event_media_type(event_type));
        }
        if self.publish_model_pubsub {
            media_types.push(self.model_media_type());
        }
        media_types
    }
}
