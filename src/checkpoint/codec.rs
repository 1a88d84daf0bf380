//! Snapshot codec.
//!
//! The canonical encoding is the JSON object
//! `{"status", "value", "context", "error"}`. A bincode encoding of the same
//! structure is offered for compact storage. Decoding always validates the
//! result; a snapshot that contradicts itself is rejected.

use crate::actor::Snapshot;
use crate::checkpoint::CheckpointError;
use crate::core::{Context, State};
use stillwater::validation::Validation;

/// Encode a snapshot as JSON bytes.
pub fn serialize<S: State, C: Context>(
    snapshot: &Snapshot<S, C>,
) -> Result<Vec<u8>, CheckpointError> {
    serde_json::to_vec(snapshot).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
}

/// Decode and validate a snapshot from JSON bytes.
pub fn deserialize<S: State, C: Context>(bytes: &[u8]) -> Result<Snapshot<S, C>, CheckpointError> {
    let snapshot: Snapshot<S, C> = serde_json::from_slice(bytes)
        .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
    validated(snapshot)
}

pub fn to_binary<S: State, C: Context>(
    snapshot: &Snapshot<S, C>,
) -> Result<Vec<u8>, CheckpointError> {
    bincode::serialize(snapshot).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
}

pub fn from_binary<S: State, C: Context>(bytes: &[u8]) -> Result<Snapshot<S, C>, CheckpointError> {
    let snapshot: Snapshot<S, C> = bincode::deserialize(bytes)
        .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
    validated(snapshot)
}

pub(crate) fn validated<S: State, C: Context>(
    snapshot: Snapshot<S, C>,
) -> Result<Snapshot<S, C>, CheckpointError> {
    match snapshot.validate() {
        Validation::Success(()) => Ok(snapshot),
        Validation::Failure(violations) => Err(CheckpointError::ValidationFailed(
            violations.iter().cloned().collect(),
        )),
    }
}
