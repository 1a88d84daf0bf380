//! Actor error types.

use crate::actor::snapshot::{SnapshotViolation, Status};
use crate::checkpoint::CheckpointError;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by actor operations
#[derive(Debug, Error)]
pub enum ActorError {
    /// The actor is stopped, done, or halted by an unhandled failure
    #[error("Actor '{id}' no longer accepts events (status: {status})")]
    NotRunning { id: String, status: Status },

    #[error("Actor '{id}' was already started")]
    AlreadyStarted { id: String },

    /// The machine needs timers or invocations but no tokio runtime is current
    #[error("No tokio runtime available to run invocations and timers")]
    NoRuntime,

    #[error("State '{state}' is not declared in machine '{machine}'")]
    UnknownState { state: String, machine: String },

    #[error("Snapshot is inconsistent: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidSnapshot(Vec<SnapshotViolation>),

    #[error("Timed out after {timeout:?} waiting for a matching snapshot")]
    Timeout { timeout: Duration },

    #[error("Invalid actor configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
