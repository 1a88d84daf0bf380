//! Checkpoint and resume functionality for actors.
//!
//! A checkpoint bundles an actor's snapshot with its transition history and
//! enough metadata to refuse resuming it into the wrong machine or from an
//! incompatible format version. Actions, guards and invocations are never
//! serialized; they come from the machine definition the checkpoint is
//! resumed into.

use crate::actor::Snapshot;
use crate::core::{Context, State, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod codec;
pub mod error;

pub use codec::{deserialize, serialize};
pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable checkpoint of an actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: State, C: Context> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// Identifier of the machine definition the actor ran
    pub machine: String,

    /// Identifier of the actor the checkpoint was taken from
    pub actor: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    pub snapshot: Snapshot<S, C>,

    /// Transitions committed before the checkpoint
    pub history: StateHistory<S>,
}

impl<S: State, C: Context> Checkpoint<S, C> {
    pub fn new(
        machine: impl Into<String>,
        actor: impl Into<String>,
        snapshot: Snapshot<S, C>,
        history: StateHistory<S>,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            machine: machine.into(),
            actor: actor.into(),
            timestamp: Utc::now(),
            snapshot,
            history,
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.verified()
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.verified()
    }

    /// Fail unless the checkpoint was taken from machine `machine`.
    pub fn ensure_machine(&self, machine: &str) -> Result<(), CheckpointError> {
        if self.machine == machine {
            Ok(())
        } else {
            Err(CheckpointError::MachineMismatch {
                found: self.machine.clone(),
                expected: machine.to_string(),
            })
        }
    }

    fn verified(self) -> Result<Self, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let Self {
            version,
            id,
            machine,
            actor,
            timestamp,
            snapshot,
            history,
        } = self;

        Ok(Self {
            version,
            id,
            machine,
            actor,
            timestamp,
            snapshot: codec::validated(snapshot)?,
            history,
        })
    }
}
