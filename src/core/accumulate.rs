//! State accumulation strategies.
//!
//! Each strategy is a pure function `(old_state, new_event_type) -> new_state`.
//! States are sets, so the result never depends on iteration order.

use super::state::State;
use serde::{Deserialize, Serialize};

/// How the next accumulated state is computed from the previous one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accumulate {
    /// Singleton of the new event type.
    Current,
    /// Previous state, unchanged.
    Keep,
    /// Singleton of another, explicitly named event type.
    Alias(String),
    /// Previous state plus the new event type.
    Union,
    /// Previous state plus the listed event types.
    Addition(Vec<String>),
    /// Previous state minus the listed event types.
    Difference(Vec<String>),
    /// Sequential fold through the listed strategies.
    Compose(Vec<Accumulate>),
}

impl Accumulate {
    /// Compute the state after `event_type` is appended to `state`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eventsource::core::{addition, compose, difference, State};
    ///
    /// let state: State = ["STARTED", "REASSIGNED"].into_iter().collect();
    /// let strategy = compose([difference(["STARTED"]), addition(["COMPLETED"])]);
    ///
    /// let next = strategy.apply(&state, "COMPLETED");
    /// assert_eq!(next.members().collect::<Vec<_>>(), vec!["COMPLETED", "REASSIGNED"]);
    /// ```
    pub fn apply(&self, state: &State, event_type: &str) -> State {
        match self {
            Self::Current => State::singleton(event_type),
            Self::Keep => state.clone(),
            Self::Alias(other) => State::singleton(other.as_str()),
            Self::Union => state.with(event_type),
            Self::Addition(names) => state
                .members()
                .chain(names.iter().map(String::as_str))
                .collect(),
            Self::Difference(names) => state
                .members()
                .filter(|member| !names.iter().any(|name| name == member))
                .collect(),
            Self::Compose(strategies) => strategies
                .iter()
                .fold(state.clone(), |acc, strategy| strategy.apply(&acc, event_type)),
        }
    }

    /// Every event type name this strategy refers to explicitly.
    pub fn referenced_event_types(&self) -> Vec<&str> {
        match self {
            Self::Current | Self::Keep | Self::Union => Vec::new(),
            Self::Alias(other) => vec![other.as_str()],
            Self::Addition(names) | Self::Difference(names) => {
                names.iter().map(String::as_str).collect()
            }
            Self::Compose(strategies) => strategies
                .iter()
                .flat_map(Accumulate::referenced_event_types)
                .collect(),
        }
    }
}

pub fn current() -> Accumulate {
    Accumulate::Current
}

pub fn keep() -> Accumulate {
    Accumulate::Keep
}

pub fn alias(other: impl Into<String>) -> Accumulate {
    Accumulate::Alias(other.into())
}

pub fn union() -> Accumulate {
    Accumulate::Union
}

pub fn addition<I, T>(names: I) -> Accumulate
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    Accumulate::Addition(names.into_iter().map(Into::into).collect())
}

pub fn difference<I, T>(names: I) -> Accumulate
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    Accumulate::Difference(names.into_iter().map(Into::into).collect())
}

pub fn compose(strategies: impl IntoIterator<Item = Accumulate>) -> Accumulate {
    Accumulate::Compose(strategies.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(members: &[&str]) -> State {
        members.iter().copied().collect()
    }

    fn members(state: &State) -> Vec<&str> {
        state.members().collect()
    }

    #[test]
    fn current_replaces_state() {
        let next = current().apply(&state(&["ASSIGNED"]), "SCHEDULED");
        assert_eq!(members(&next), vec!["SCHEDULED"]);
    }

    #[test]
    fn keep_preserves_state() {
        let next = keep().apply(&state(&["ASSIGNED"]), "SCHEDULED");
        assert_eq!(members(&next), vec!["ASSIGNED"]);
    }

    #[test]
    fn keep_on_empty_state_is_empty() {
        assert!(keep().apply(&State::empty(), "CREATED").is_empty());
    }

    #[test]
    fn alias_uses_other_event_type() {
        let next = alias("CREATED").apply(&state(&["STARTED"]), "REVISED");
        assert_eq!(members(&next), vec!["CREATED"]);
    }

    #[test]
    fn union_adds_new_event_type() {
        let next = union().apply(&state(&["CREATED"]), "ASSIGNED");
        assert_eq!(members(&next), vec!["ASSIGNED", "CREATED"]);
    }

    #[test]
    fn union_does_not_duplicate() {
        let next = union().apply(&state(&["ASSIGNED", "CREATED"]), "ASSIGNED");
        assert_eq!(members(&next), vec!["ASSIGNED", "CREATED"]);
    }

    #[test]
    fn addition_adds_listed_types() {
        let next = addition(["ASSIGNED"]).apply(&state(&["CREATED"]), "ASSIGNED");
        assert_eq!(members(&next), vec!["ASSIGNED", "CREATED"]);
    }

    #[test]
    fn difference_removes_listed_types() {
        let next = difference(["ASSIGNED"]).apply(&state(&["CREATED", "ASSIGNED"]), "CANCELED");
        assert_eq!(members(&next), vec!["CREATED"]);
    }

    #[test]
    fn compose_threads_state_in_order() {
        let strategy = compose([difference(["STARTED"]), addition(["COMPLETED"])]);
        let next = strategy.apply(&state(&["STARTED", "REASSIGNED"]), "COMPLETED");
        assert_eq!(members(&next), vec!["COMPLETED", "REASSIGNED"]);
    }

    #[test]
    fn compose_observes_previous_step() {
        // the difference only sees COMPLETED because current() ran first
        let strategy = compose([current(), difference(["COMPLETED"])]);
        assert!(strategy.apply(&state(&["STARTED"]), "COMPLETED").is_empty());
    }

    #[test]
    fn referenced_names_include_nested_strategies() {
        let strategy = compose([alias("CREATED"), difference(["STARTED"]), union()]);
        assert_eq!(strategy.referenced_event_types(), vec!["CREATED", "STARTED"]);
    }
}
