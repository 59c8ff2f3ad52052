//! Transition grammar.
//!
//! A small boolean expression language over "does event X appear in the
//! accumulated state". Expressions are plain data rather than closures so
//! that the registry analyzer can inspect them.

use super::state::State;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition an event type must satisfy to follow a container's state.
///
/// `Never` evaluates to false but marks the event type as one that may
/// start a chain. That marker is exposed through [`Follows::is_initial`]
/// and is independent of evaluation.
///
/// # Example
///
/// ```rust
/// use eventsource::core::{all_of, but_not, State};
///
/// let follows = all_of(["CREATED".into(), but_not("ASSIGNED")]);
///
/// assert!(follows.evaluate(&State::singleton("CREATED")));
/// assert!(!follows.evaluate(&["CREATED", "ASSIGNED"].into_iter().collect()));
/// assert!(!follows.is_initial());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Follows {
    /// True iff the named event type is a member of the state.
    MatchEvent(String),
    /// Conjunction; the empty conjunction is true.
    AllOf(Vec<Follows>),
    /// Disjunction; the empty disjunction is false.
    AnyOf(Vec<Follows>),
    Not(Box<Follows>),
    /// May only be initial.
    Never,
}

impl Follows {
    /// Evaluate this expression against an accumulated state.
    pub fn evaluate(&self, state: &State) -> bool {
        match self {
            Self::MatchEvent(name) => state.contains(name),
            Self::AllOf(items) => items.iter().all(|item| item.evaluate(state)),
            Self::AnyOf(items) => items.iter().any(|item| item.evaluate(state)),
            Self::Not(inner) => !inner.evaluate(state),
            Self::Never => false,
        }
    }

    /// Whether an event type with this condition may start a chain.
    ///
    /// `Never` is initial; a disjunction is initial when any branch is;
    /// a non-empty conjunction is initial when every branch is.
    pub fn is_initial(&self) -> bool {
        match self {
            Self::Never => true,
            Self::AnyOf(items) => items.iter().any(Follows::is_initial),
            Self::AllOf(items) => !items.is_empty() && items.iter().all(Follows::is_initial),
            Self::MatchEvent(_) | Self::Not(_) => false,
        }
    }

    /// Every event type name mentioned by this expression.
    pub fn referenced_event_types(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::MatchEvent(name) => names.push(name),
            Self::AllOf(items) | Self::AnyOf(items) => {
                for item in items {
                    item.collect_names(names);
                }
            }
            Self::Not(inner) => inner.collect_names(names),
            Self::Never => {}
        }
    }
}

impl From<&str> for Follows {
    fn from(name: &str) -> Self {
        Self::MatchEvent(name.to_string())
    }
}

impl From<String> for Follows {
    fn from(name: String) -> Self {
        Self::MatchEvent(name)
    }
}

impl fmt::Display for Follows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, tag: &str, items: &[Follows]) -> fmt::Result {
            write!(f, "{tag}(")?;
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            write!(f, ")")
        }

        match self {
            Self::MatchEvent(name) => write!(f, "{name}"),
            Self::AllOf(items) => list(f, "all_of", items),
            Self::AnyOf(items) => list(f, "any_of", items),
            Self::Not(inner) => write!(f, "but_not({inner})"),
            Self::Never => write!(f, "nothing"),
        }
    }
}

/// Match a specific event type.
pub fn event(name: impl Into<String>) -> Follows {
    Follows::MatchEvent(name.into())
}

/// Match when every item matches. Strings are normalized to [`event`].
pub fn all_of<I, T>(items: I) -> Follows
where
    I: IntoIterator<Item = T>,
    T: Into<Follows>,
{
    Follows::AllOf(items.into_iter().map(Into::into).collect())
}

/// Match when any item matches. Strings are normalized to [`event`].
pub fn any_of<I, T>(items: I) -> Follows
where
    I: IntoIterator<Item = T>,
    T: Into<Follows>,
{
    Follows::AnyOf(items.into_iter().map(Into::into).collect())
}

pub fn but_not(item: impl Into<Follows>) -> Follows {
    Follows::Not(Box::new(item.into()))
}

/// The initial-only condition.
pub fn nothing() -> Follows {
    Follows::Never
}
