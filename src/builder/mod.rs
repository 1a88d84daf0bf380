//! Builder API for ergonomic machine construction.
//!
//! How a definition was built never affects how it runs: builders only
//! assemble and validate a [`MachineDefinition`](crate::definition::MachineDefinition).

pub mod error;
pub mod machine;
pub mod macros;
pub mod state;
pub mod transition;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use state::StateBuilder;
pub use transition::TransitionBuilder;

use crate::core::State;

/// Start a transition candidate targeting `target`.
///
/// # Example
///
/// ```
/// use statecraft::builder::{transition, StateBuilder};
/// use statecraft::core::Signal;
/// use statecraft::state_enum;
///
/// state_enum! {
///     enum Pump {
///         Idle => "idle",
///         Running => "running",
///     }
/// }
///
/// #[derive(Clone, Debug)]
/// struct Start;
///
/// impl statecraft::core::Event for Start {
///     fn name(&self) -> &str { "START" }
/// }
///
/// let idle: StateBuilder<Pump, u32, Start> = StateBuilder::new().on_with(
///     "START",
///     transition(Pump::Running)
///         .when(|pressure: &u32, _: &Signal<Start>| *pressure > 0)
///         .assign(|pressure: &mut u32, _: &Signal<Start>| *pressure -= 1),
/// );
/// ```
pub fn transition<S, C, E>(target: S) -> TransitionBuilder<S, C, E>
where
    S: State,
    C: Clone + 'static,
    E: 'static,
{
    TransitionBuilder::new().target(target)
}
