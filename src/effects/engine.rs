//! The transition engine.
//!
//! `step` is a pure function of (node, context, signal): it picks the first
//! candidate whose guard passes and threads the context through its actions.
//! It never suspends and never performs I/O.

use crate::core::{Event, Signal, State};
use crate::definition::StateNode;

/// Outcome of feeding one signal to a state node.
#[derive(Clone, Debug, PartialEq)]
pub enum StepResult<S, C> {
    /// A candidate matched; the machine moves to `target` with `context`.
    Transitioned { target: S, context: C },

    /// No transition for this trigger, or no guard passed.
    Ignored,
}

impl<S, C> StepResult<S, C> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

/// Compute the next state and context for `signal`.
pub fn step<S, C, E, Env>(
    node: &StateNode<S, C, E, Env>,
    context: &C,
    signal: &Signal<E>,
) -> StepResult<S, C>
where
    S: State,
    C: Clone,
    E: Event,
{
    let trigger = signal.trigger();

    let Some(candidate) = node
        .candidates(&trigger)
        .iter()
        .find(|candidate| candidate.applies(context, signal))
    else {
        return StepResult::Ignored;
    };

    StepResult::Transitioned {
        target: candidate.target.clone(),
        context: candidate.apply(context, signal),
    }
}
