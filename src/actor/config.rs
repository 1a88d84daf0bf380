//! Actor configuration.

use crate::actor::error::ActorError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-actor settings.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use statecraft::actor::ActorConfig;
///
/// let config = ActorConfig::from_json(r#"{ "id": "job-42", "history_limit": 16 }"#).unwrap();
/// assert_eq!(config.id, "job-42");
/// assert!(config.record_history);
/// assert_eq!(config.history_limit, Some(16));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActorConfig {
    /// Identifier used in logs and checkpoints
    pub id: String,

    /// Whether committed transitions are recorded in the actor's history
    pub record_history: bool,

    /// Keep only this many most recent transitions
    pub history_limit: Option<usize>,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            record_history: true,
            history_limit: None,
        }
    }
}

impl ActorConfig {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn without_history(mut self) -> Self {
        self.record_history = false;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ActorError> {
        serde_json::from_str(json).map_err(|e| ActorError::InvalidConfig(e.to_string()))
    }
}
