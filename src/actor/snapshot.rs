//! Point-in-time view of an actor.

use crate::core::{Context, State};
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Coarse lifecycle of the machine instance a snapshot was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Done,
    Errored,
    Stopped,
}

impl Status {
    /// Status implied by sitting in `state` with no failure recorded.
    pub fn for_state<S: State>(state: &S) -> Self {
        if state.is_final() {
            Self::Done
        } else if state.is_error() {
            Self::Errored
        } else {
            Self::Active
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Done => "done",
            Self::Errored => "errored",
            Self::Stopped => "stopped",
        })
    }
}

/// Failure that halted an actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    /// State whose invocation failed
    pub state: String,
}

/// The externally visible (status, state, context, error) tuple.
///
/// This is also the wire format: the four fields are serialized verbatim and
/// nothing else is accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "", deny_unknown_fields)]
pub struct Snapshot<S: State, C: Context> {
    pub status: Status,
    pub value: S,
    pub context: C,
    pub error: Option<ErrorInfo>,
}

/// A way in which a snapshot contradicts its own state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotViolation {
    #[error("status is done but state '{state}' is not final")]
    DoneOutsideFinalState { state: String },

    #[error("state '{state}' is final but status is {status}")]
    FinalStateNotDone { state: String, status: Status },

    #[error("status is errored but state '{state}' is not an error state and no error is recorded")]
    ErroredWithoutCause { state: String },

    #[error("error info is present but status is {status}")]
    UnexpectedErrorInfo { status: Status },

    #[error("state '{state}' is an error state but status is active")]
    ErrorStateMarkedActive { state: String },
}

impl<S: State, C: Context> Snapshot<S, C> {
    /// Snapshot of a fresh instance sitting in `state` with `context`.
    pub fn at(state: S, context: C) -> Self {
        Self {
            status: Status::for_state(&state),
            value: state,
            context,
            error: None,
        }
    }

    /// Whether the snapshot is in `state`.
    pub fn matches(&self, state: &S) -> bool {
        &self.value == state
    }

    /// Whether an actor holding this snapshot can still process events.
    pub fn can_continue(&self) -> bool {
        matches!(self.status, Status::Active | Status::Errored) && self.error.is_none()
    }

    /// Check that status, state and error agree. Accumulates ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<SnapshotViolation>> {
        let state = self.value.name().to_string();
        let mut checks: Vec<Validation<(), NonEmptyVec<SnapshotViolation>>> = Vec::new();

        if self.status == Status::Done && !self.value.is_final() {
            checks.push(Validation::fail(SnapshotViolation::DoneOutsideFinalState {
                state: state.clone(),
            }));
        }

        if self.value.is_final() && self.status != Status::Done {
            checks.push(Validation::fail(SnapshotViolation::FinalStateNotDone {
                state: state.clone(),
                status: self.status,
            }));
        }

        if self.status == Status::Errored && !self.value.is_error() && self.error.is_none() {
            checks.push(Validation::fail(SnapshotViolation::ErroredWithoutCause {
                state: state.clone(),
            }));
        }

        if self.error.is_some() && self.status != Status::Errored {
            checks.push(Validation::fail(SnapshotViolation::UnexpectedErrorInfo {
                status: self.status,
            }));
        }

        if self.value.is_error() && self.status == Status::Active {
            checks.push(Validation::fail(SnapshotViolation::ErrorStateMarkedActive {
                state,
            }));
        }

        Validation::all_vec(checks).map(|_| ())
    }
}
