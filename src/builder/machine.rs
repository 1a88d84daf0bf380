//! Builder for constructing machine definitions.

use crate::builder::error::BuildError;
use crate::builder::state::StateBuilder;
use crate::core::State;
use crate::definition::MachineDefinition;
use std::collections::HashMap;
use stillwater::validation::Validation;

/// Builder for constructing machine definitions with a fluent API.
pub struct MachineBuilder<S: State, C, E, Env = ()> {
    id: String,
    initial: Option<S>,
    context: Option<C>,
    states: Vec<(S, StateBuilder<S, C, E, Env>)>,
}

impl<S: State, C: Clone + 'static, E: 'static, Env> MachineBuilder<S, C, E, Env> {
    /// Create a new builder for the machine named `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initial: None,
            context: None,
            states: Vec::new(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Set the initial context (required).
    pub fn context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// Declare a state and its node.
    pub fn state(mut self, state: S, node: StateBuilder<S, C, E, Env>) -> Self {
        self.states.push((state, node));
        self
    }

    /// Build and validate the definition.
    pub fn build(self) -> Result<MachineDefinition<S, C, E, Env>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let context = self.context.ok_or(BuildError::MissingContext)?;

        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        let mut states = HashMap::with_capacity(self.states.len());
        for (state, builder) in self.states {
            let name = state.name().to_string();
            if states.contains_key(&name) {
                return Err(BuildError::DuplicateState { state: name });
            }
            let node = builder.build(&state)?;
            states.insert(name, (state, node));
        }

        let definition = MachineDefinition {
            id: self.id,
            initial,
            context,
            states,
        };

        match definition.validate() {
            Validation::Success(_) => Ok(definition),
            Validation::Failure(errors) => Err(BuildError::InvalidDefinition(
                errors.iter().cloned().collect(),
            )),
        }
    }
}
