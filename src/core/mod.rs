//! Core state machine types and logic.
//!
//! Everything in this module is pure: states, events, guards, copy-on-write
//! context updates and immutable transition history.

pub mod context;
mod event;
mod guard;
mod history;
mod state;

pub use context::Context;
pub use event::{Event, InvocationError, Signal, Trigger};
pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use state::State;
