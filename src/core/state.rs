//! Accumulated state of a container.
//!
//! A state is the duplicate-free set of event type names that are
//! "currently true" for a container. It is kept in canonical sorted
//! order so that persistence, hashing and display are deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Duplicate-free, lexicographically ordered set of event type names.
///
/// Two states are equal iff they contain the same members; because the
/// members live in a `BTreeSet` the iteration order is always the
/// canonical sorted order, regardless of how the state was built.
///
/// # Example
///
/// ```rust
/// use eventsource::core::State;
///
/// let a: State = ["SCHEDULED", "CREATED"].into_iter().collect();
/// let b: State = ["CREATED", "SCHEDULED", "CREATED"].into_iter().collect();
///
/// assert_eq!(a, b);
/// assert_eq!(a.members().collect::<Vec<_>>(), vec!["CREATED", "SCHEDULED"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(BTreeSet<String>);

impl State {
    /// The empty state, used as the "before" state of an initial event.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// A state holding exactly one event type.
    pub fn singleton(name: impl Into<String>) -> Self {
        let mut members = BTreeSet::new();
        members.insert(name.into());
        Self(members)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Members in canonical (sorted) order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Return a new state with `name` added.
    pub fn with(&self, name: &str) -> Self {
        let mut members = self.0.clone();
        members.insert(name.to_string());
        Self(members)
    }

    /// Return a new state with `name` removed.
    pub fn without(&self, name: &str) -> Self {
        let mut members = self.0.clone();
        members.remove(name);
        Self(members)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for State {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, member) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{member}")?;
        }
        write!(f, "]")
    }
}
