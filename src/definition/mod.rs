//! Immutable machine definitions.
//!
//! A [`MachineDefinition`] is built once (see [`crate::builder`]) and then
//! shared read-only by every actor running it, so it needs no locking.
//!
//! Validation uses Stillwater's `Validation` to report every broken reference
//! in one pass instead of stopping at the first.

mod error;
mod node;

pub use error::DefinitionError;
pub use node::StateNode;

use crate::core::State;
use std::collections::HashMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Initial state, initial context and the node of every state.
pub struct MachineDefinition<S: State, C, E, Env = ()> {
    pub(crate) id: String,
    pub(crate) initial: S,
    pub(crate) context: C,
    pub(crate) states: HashMap<String, (S, StateNode<S, C, E, Env>)>,
}

impl<S: State, C, E, Env> MachineDefinition<S, C, E, Env> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn initial_state(&self) -> &S {
        &self.initial
    }

    pub fn initial_context(&self) -> &C {
        &self.context
    }

    /// Node declared for `state`.
    pub fn node(&self, state: &S) -> Option<&StateNode<S, C, E, Env>> {
        self.states.get(state.name()).map(|(_, node)| node)
    }

    pub fn contains(&self, state: &S) -> bool {
        self.states
            .get(state.name())
            .is_some_and(|(declared, _)| declared == state)
    }

    /// Look a state up by its name.
    pub fn state_named(&self, name: &str) -> Option<&S> {
        self.states.get(name).map(|(state, _)| state)
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.states.values().map(|(state, _)| state)
    }

    /// Whether any state runs an invocation or arms a timer.
    pub fn requires_runtime(&self) -> bool {
        self.states
            .values()
            .any(|(_, node)| node.invocation.is_some() || !node.delays().is_empty())
    }

    /// Check that the initial state and every transition target are declared.
    ///
    /// Accumulates ALL problems.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<DefinitionError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<DefinitionError>>> = Vec::new();

        checks.push(if self.contains(&self.initial) {
            Validation::success(())
        } else {
            Validation::fail(DefinitionError::UnknownInitialState {
                state: self.initial.name().to_string(),
            })
        });

        let mut names: Vec<&String> = self.states.keys().collect();
        names.sort();
        for name in names {
            let (_, node) = &self.states[name];
            for (trigger, target) in node.targets() {
                if !self.contains(target) {
                    checks.push(Validation::fail(DefinitionError::UnknownTarget {
                        state: name.clone(),
                        trigger: trigger.to_string(),
                        target: target.name().to_string(),
                    }));
                }
            }
        }

        Validation::all_vec(checks).map(|_| ())
    }
}
