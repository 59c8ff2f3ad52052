//! State-space analysis.
//!
//! Breadth-first exploration of every accumulated state reachable from the
//! registry's initial event types. States are deduplicated by value, and the
//! state universe is bounded by the subsets of the finite set of event types,
//! so exploration always terminates.

use super::error::RegistryError;
use super::EventTypeRegistry;
use crate::core::{EventType, State};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::warn;

/// One edge of the state machine: `event_type` moves `from` to `to`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: State,
    pub to: State,
    pub event_type: String,
}

struct Exploration<'a> {
    states: Vec<State>,
    arrivals: Vec<(State, &'a EventType)>,
    transitions: Vec<StateTransition>,
}

impl EventTypeRegistry {
    pub fn initial_event_types(&self) -> impl Iterator<Item = &EventType> {
        self.iter().filter(|event_type| event_type.is_initial())
    }

    /// Singleton states of every initial event type.
    pub fn initial_states(&self) -> Vec<State> {
        self.initial_event_types()
            .map(|event_type| State::singleton(event_type.name()))
            .collect()
    }

    /// Every event type whose grammar accepts `state`.
    pub fn available_transitions(&self, state: &State) -> Vec<&EventType> {
        self.iter()
            .filter(|event_type| event_type.may_transition(state))
            .collect()
    }

    /// Auto-transition event types, in name order.
    pub fn auto_transition_events(&self) -> Vec<&EventType> {
        self.iter()
            .filter(|event_type| event_type.is_auto_transition())
            .collect()
    }

    /// Every reachable state, in breadth-first discovery order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eventsource::core::{current, event_info, State};
    /// use eventsource::registry::EventTypeRegistry;
    ///
    /// let registry = EventTypeRegistry::builder("light")
    ///     .event_type(event_info("RED").accumulate(current()))
    ///     .event_type(event_info("GREEN").follows("RED").accumulate(current()))
    ///     .event_type(event_info("YELLOW").follows("GREEN").accumulate(current()))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(
    ///     registry.all_states(),
    ///     vec![State::singleton("RED"), State::singleton("GREEN"), State::singleton("YELLOW")]
    /// );
    /// ```
    pub fn all_states(&self) -> Vec<State> {
        self.explore().states
    }

    /// Every reachable state paired with each event type that produces it.
    pub fn all_states_and_events(&self) -> Vec<(State, &EventType)> {
        self.explore().arrivals
    }

    /// The full (from-state, to-state, event type) relation.
    pub fn all_transitions(&self) -> Vec<StateTransition> {
        self.explore().transitions
    }

    /// Transitions leaving any of the given states.
    pub fn transitions_from(&self, states: &[State]) -> Vec<StateTransition> {
        states
            .iter()
            .flat_map(|from| {
                self.available_transitions(from)
                    .into_iter()
                    .map(move |event_type| StateTransition {
                        from: from.clone(),
                        to: event_type.accumulate_state(from),
                        event_type: event_type.name().to_string(),
                    })
            })
            .collect()
    }

    /// Reachable states from which an auto-transition competes with
    /// another transition.
    pub fn ambiguous_states(&self) -> Vec<State> {
        self.all_states()
            .into_iter()
            .filter(|state| !self.is_unambiguous(state))
            .collect()
    }

    /// Whether at most one auto-transition is ever legal, and only when
    /// nothing else is.
    pub fn has_only_valid_transitions(&self) -> bool {
        self.all_states()
            .iter()
            .all(|state| self.is_unambiguous(state))
    }

    /// Like [`has_only_valid_transitions`](Self::has_only_valid_transitions),
    /// reporting the offending states.
    pub fn validate_transitions(&self) -> Result<(), RegistryError> {
        let states = self.ambiguous_states();
        if states.is_empty() {
            return Ok(());
        }

        warn!(
            registry = %self.name,
            states = states.len(),
            "Registry has competing auto-transitions"
        );
        Err(RegistryError::InvalidAutoTransitions {
            registry: self.name.clone(),
            states,
        })
    }

    fn is_unambiguous(&self, state: &State) -> bool {
        let available = self.available_transitions(state);
        let automatic = available
            .iter()
            .filter(|event_type| event_type.is_auto_transition())
            .count();

        automatic == 0 || (automatic == 1 && available.len() == 1)
    }

    fn explore(&self) -> Exploration<'_> {
        let mut seen = HashSet::new();
        let mut arrived = HashSet::new();
        let mut queue = VecDeque::new();
        let mut exploration = Exploration {
            states: Vec::new(),
            arrivals: Vec::new(),
            transitions: Vec::new(),
        };

        for event_type in self.initial_event_types() {
            let state = State::singleton(event_type.name());
            if arrived.insert((state.clone(), event_type.name())) {
                exploration.arrivals.push((state.clone(), event_type));
            }
            if seen.insert(state.clone()) {
                exploration.states.push(state.clone());
                queue.push_back(state);
            }
        }

        while let Some(from) = queue.pop_front() {
            for event_type in self.available_transitions(&from) {
                let to = event_type.accumulate_state(&from);

                if arrived.insert((to.clone(), event_type.name())) {
                    exploration.arrivals.push((to.clone(), event_type));
                }
                exploration.transitions.push(StateTransition {
                    from: from.clone(),
                    to: to.clone(),
                    event_type: event_type.name().to_string(),
                });
                if seen.insert(to.clone()) {
                    exploration.states.push(to.clone());
                    queue.push_back(to);
                }
            }
        }

        exploration
    }
}
