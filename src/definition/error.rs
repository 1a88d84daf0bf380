//! Problems found while validating a machine definition.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Initial state '{state}' is not declared")]
    UnknownInitialState { state: String },

    #[error("State '{state}' has a '{trigger}' transition to undeclared state '{target}'")]
    UnknownTarget {
        state: String,
        trigger: String,
        target: String,
    },
}
