//! Builder for the node of a single state.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{State, Trigger};
use crate::definition::StateNode;
use crate::effects::Invocation;
use std::time::Duration;

/// Collects the transitions, invocation and timers of one state.
///
/// Transitions for the same trigger are kept in the order they are added;
/// the first one whose guard passes wins.
pub struct StateBuilder<S: State, C, E, Env = ()> {
    transitions: Vec<(Trigger, TransitionBuilder<S, C, E>)>,
    invocation: Option<Invocation<C, Env>>,
}

impl<S: State, C: Clone + 'static, E: 'static, Env> StateBuilder<S, C, E, Env> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            invocation: None,
        }
    }

    /// Unconditional transition to `target` on the named event.
    pub fn on(self, event: impl Into<String>, target: S) -> Self {
        self.on_with(event, TransitionBuilder::new().target(target))
    }

    /// Transition on the named event, with guard and actions.
    pub fn on_with(
        mut self,
        event: impl Into<String>,
        transition: TransitionBuilder<S, C, E>,
    ) -> Self {
        self.transitions.push((Trigger::Event(event.into()), transition));
        self
    }

    /// Transition taken when this state's invocation completes.
    pub fn on_done(mut self, transition: TransitionBuilder<S, C, E>) -> Self {
        self.transitions.push((Trigger::Done, transition));
        self
    }

    /// Transition taken when this state's invocation fails.
    pub fn on_error(mut self, transition: TransitionBuilder<S, C, E>) -> Self {
        self.transitions.push((Trigger::Error, transition));
        self
    }

    /// Move to `target` if no other transition leaves this state within `delay`.
    pub fn after(self, delay: Duration, target: S) -> Self {
        self.after_with(delay, TransitionBuilder::new().target(target))
    }

    /// Delayed transition with guard and actions.
    pub fn after_with(mut self, delay: Duration, transition: TransitionBuilder<S, C, E>) -> Self {
        self.transitions.push((Trigger::After(delay), transition));
        self
    }

    /// Run `invocation` every time this state is entered.
    pub fn invoke(mut self, invocation: Invocation<C, Env>) -> Self {
        self.invocation = Some(invocation);
        self
    }

    pub(crate) fn build(self, state: &S) -> Result<StateNode<S, C, E, Env>, BuildError> {
        let mut node = StateNode::new();
        for (trigger, transition) in self.transitions {
            let candidate = transition.build(state.name(), &trigger.to_string())?;
            node.transitions.entry(trigger).or_default().push(candidate);
        }
        node.invocation = self.invocation;
        Ok(node)
    }
}

impl<S: State, C: Clone + 'static, E: 'static, Env> Default for StateBuilder<S, C, E, Env> {
    fn default() -> Self {
        Self::new()
    }
}
