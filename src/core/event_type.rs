//! Event type metadata.
//!
//! An [`EventTypeInfo`] is the author-facing declaration of one event type;
//! the registry turns it into an immutable [`EventType`] once every
//! reference has been checked.

use super::accumulate::Accumulate;
use super::grammar::Follows;
use super::state::State;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declaration of an event type, built with a fluent API.
///
/// # Example
///
/// ```rust
/// use eventsource::core::{all_of, but_not, event_info, union};
///
/// let assigned = event_info("ASSIGNED")
///     .follows(all_of(["CREATED".into(), but_not("ASSIGNED")]))
///     .accumulate(union())
///     .requires(["assignee"]);
///
/// assert_eq!(assigned.name(), "ASSIGNED");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EventTypeInfo {
    pub(crate) name: String,
    pub(crate) follows: Follows,
    pub(crate) accumulate: Option<Accumulate>,
    pub(crate) restarting: bool,
    pub(crate) requires: BTreeSet<String>,
    pub(crate) auto_transition: bool,
}

impl EventTypeInfo {
    /// Declare an event type. Without a `follows` condition it is initial-only.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            follows: Follows::Never,
            accumulate: None,
            restarting: false,
            requires: BTreeSet::new(),
            auto_transition: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn follows(mut self, follows: impl Into<Follows>) -> Self {
        self.follows = follows.into();
        self
    }

    pub fn accumulate(mut self, strategy: Accumulate) -> Self {
        self.accumulate = Some(strategy);
        self
    }

    /// Mark the event type as starting a new version.
    pub fn restarting(mut self) -> Self {
        self.restarting = true;
        self
    }

    pub fn requires<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.requires.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Mark the event type as appended automatically once it becomes legal.
    pub fn auto_transition(mut self) -> Self {
        self.auto_transition = true;
        self
    }
}

/// Shorthand for [`EventTypeInfo::new`].
pub fn event_info(name: impl Into<String>) -> EventTypeInfo {
    EventTypeInfo::new(name)
}

/// A validated, immutable member of an event type registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    name: String,
    follows: Follows,
    accumulate: Accumulate,
    restarting: bool,
    requires: BTreeSet<String>,
    auto_transition: bool,
}

impl EventType {
    pub(crate) fn from_parts(info: EventTypeInfo, accumulate: Accumulate) -> Self {
        Self {
            name: info.name,
            follows: info.follows,
            accumulate,
            restarting: info.restarting,
            requires: info.requires,
            auto_transition: info.auto_transition,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn follows(&self) -> &Follows {
        &self.follows
    }

    pub fn accumulation(&self) -> &Accumulate {
        &self.accumulate
    }

    pub fn requires(&self) -> &BTreeSet<String> {
        &self.requires
    }

    /// Can this event type be the initial event of a chain?
    pub fn is_initial(&self) -> bool {
        self.follows.is_initial()
    }

    pub fn is_restarting(&self) -> bool {
        self.restarting
    }

    pub fn is_auto_transition(&self) -> bool {
        self.auto_transition
    }

    /// Does the grammar allow this event type to follow `state`?
    pub fn may_transition(&self, state: &State) -> bool {
        self.follows.evaluate(state)
    }

    /// Legality against an optional parent state.
    ///
    /// Without a parent only initial event types are legal; with a parent
    /// the grammar decides, so `Never` can only ever start a chain.
    pub fn is_legal_after(&self, parent_state: Option<&State>) -> bool {
        match parent_state {
            None => self.is_initial(),
            Some(state) => self.may_transition(state),
        }
    }

    pub fn accumulate_state(&self, state: &State) -> State {
        self.accumulate.apply(state, &self.name)
    }

    /// Version of an event of this type given its parent's version.
    ///
    /// `None` when a restarting event would overflow the version.
    pub fn next_version(&self, parent_version: Option<u32>) -> Option<u32> {
        match parent_version {
            None => Some(1),
            Some(version) if self.restarting => version.checked_add(1),
            Some(version) => Some(version),
        }
    }
}
