//! Events, and the signals the transition engine reacts to.
//!
//! External callers speak in terms of their own event enum. The engine sees a
//! wider vocabulary: the same external events plus the synthetic completions
//! produced by invocations and delayed transitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;

/// Trait for external machine events.
///
/// The `name` is the event type used to look up transitions, so every variant
/// of an event enum should report a distinct name. Payload fields are only
/// interpreted by guards and actions.
///
/// # Example
///
/// ```rust
/// use statecraft::core::Event;
///
/// #[derive(Clone, Debug)]
/// enum TrainEvent {
///     Board { count: u32 },
///     Depart { destination: String },
/// }
///
/// impl Event for TrainEvent {
///     fn name(&self) -> &str {
///         match self {
///             Self::Board { .. } => "BOARD",
///             Self::Depart { .. } => "DEPART",
///         }
///     }
/// }
///
/// assert_eq!(TrainEvent::Board { count: 3 }.name(), "BOARD");
/// ```
pub trait Event: Clone + Debug + Send + Sync + 'static {
    fn name(&self) -> &str;
}

/// Failure reported by an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvocationError {
    /// The unit of work returned an error.
    #[error("invocation failed: {message}")]
    Failed { message: String },

    /// The unit of work panicked before producing a result.
    #[error("invocation panicked: {message}")]
    Panicked { message: String },
}

impl InvocationError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// The bare failure message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Failed { message } | Self::Panicked { message } => message,
        }
    }
}

/// Everything that can drive a transition.
#[derive(Clone, Debug)]
pub enum Signal<E> {
    /// An event sent by an external caller.
    Event(E),

    /// The current state's invocation completed with `output`.
    Done { output: Value },

    /// The current state's invocation failed.
    Error { error: InvocationError },

    /// A delayed transition armed on state entry has elapsed.
    After { delay: Duration },
}

impl<E: Event> Signal<E> {
    /// The key this signal is looked up under in a state node.
    pub fn trigger(&self) -> Trigger {
        match self {
            Self::Event(event) => Trigger::Event(event.name().to_string()),
            Self::Done { .. } => Trigger::Done,
            Self::Error { .. } => Trigger::Error,
            Self::After { delay } => Trigger::After(*delay),
        }
    }

    /// The external event, if this signal carries one.
    pub fn event(&self) -> Option<&E> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }

    /// The invocation output, if this is a completion.
    pub fn output(&self) -> Option<&Value> {
        match self {
            Self::Done { output } => Some(output),
            _ => None,
        }
    }
}

/// Lookup key for the transitions of a state node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    Event(String),
    Done,
    Error,
    After(Duration),
}

impl Trigger {
    pub fn event(name: impl Into<String>) -> Self {
        Self::Event(name.into())
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event(name) => f.write_str(name),
            Self::Done => f.write_str("done.invoke"),
            Self::Error => f.write_str("error.invoke"),
            Self::After(delay) => write!(f, "after.{}ms", delay.as_millis()),
        }
    }
}
