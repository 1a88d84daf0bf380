//! Build errors for machine, state and transition builders.

use crate::definition::DefinitionError;
use thiserror::Error;

/// Errors that can occur when building machine definitions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Initial context not specified. Call .context(value) before .build()")]
    MissingContext,

    #[error("No states declared. Add at least one state")]
    NoStates,

    #[error("State '{state}' is declared more than once")]
    DuplicateState { state: String },

    #[error("Transition on '{trigger}' in state '{state}' has no target. Call .target(state)")]
    MissingTarget { state: String, trigger: String },

    #[error("Machine definition is invalid ({} problem(s)): {}", .0.len(), summarize(.0))]
    InvalidDefinition(Vec<DefinitionError>),
}

fn summarize(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
