//! State identifiers for machine definitions.
//!
//! A state value names a node in a [`MachineDefinition`](crate::definition::MachineDefinition)
//! and decides, on its own, whether that node is final or an error state.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// States are plain values, usually fieldless enums. The `name` of a state is
/// its key inside a machine definition, so names must be unique per machine.
///
/// # Example
///
/// ```rust
/// use statecraft::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Door {
///     Open,
///     Closed,
///     Broken,
/// }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "open",
///             Self::Closed => "closed",
///             Self::Broken => "broken",
///         }
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Broken)
///     }
/// }
///
/// assert_eq!(Door::Closed.name(), "closed");
/// assert!(Door::Broken.is_error());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Key of the state inside its machine definition.
    fn name(&self) -> &str;

    /// Whether reaching this state finishes the actor (`status = done`).
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Whether this is an explicit error state (`status = errored`).
    ///
    /// Error states still accept events, which is what makes retry routing
    /// possible. Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}
