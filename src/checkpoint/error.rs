//! Checkpoint error types.

use crate::actor::SnapshotViolation;
use thiserror::Error;

/// Errors that can occur while encoding or decoding snapshots and checkpoints
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Input was not a well-formed snapshot or checkpoint
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Checkpoint version is not supported by this version
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Checkpoint was taken from a different machine
    #[error("Checkpoint belongs to machine '{found}', expected '{expected}'")]
    MachineMismatch { found: String, expected: String },

    /// Decoded snapshot contradicts itself
    #[error("Snapshot validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    ValidationFailed(Vec<SnapshotViolation>),
}
