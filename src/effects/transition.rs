//! Transition candidates: a target, an optional guard and ordered actions.

use crate::core::context;
use crate::core::{Guard, Signal, State};
use std::sync::Arc;

/// Context update bound to a transition.
///
/// Actions are pure: they receive the current context and the signal and
/// return the next context. Any I/O belongs in an invocation.
pub type Action<C, E> = Arc<dyn Fn(&C, &Signal<E>) -> C + Send + Sync>;

/// Action that edits a draft of the context.
pub fn assign<C, E, F>(recipe: F) -> Action<C, E>
where
    C: Clone,
    F: Fn(&mut C, &Signal<E>) + Send + Sync + 'static,
{
    Arc::new(move |ctx, signal| context::update(ctx, |draft| recipe(draft, signal)))
}

/// Action that builds the next context from the current one.
pub fn produce<C, E, F>(recipe: F) -> Action<C, E>
where
    F: Fn(&C, &Signal<E>) -> C + Send + Sync + 'static,
{
    Arc::new(move |ctx, signal| context::replace(ctx, |old| recipe(old, signal)))
}

/// One way a state can react to a trigger.
pub struct TransitionCandidate<S: State, C, E> {
    pub target: S,
    pub guard: Option<Guard<C, E>>,
    pub actions: Vec<Action<C, E>>,
}

impl<S: State, C, E> TransitionCandidate<S, C, E> {
    /// Check whether the guard admits this candidate (pure).
    ///
    /// A candidate without a guard always applies.
    pub fn applies(&self, context: &C, signal: &Signal<E>) -> bool {
        match &self.guard {
            Some(guard) => guard.check(context, signal),
            None => true,
        }
    }

    /// Thread `context` through every action in declaration order.
    pub fn apply(&self, context: &C, signal: &Signal<E>) -> C
    where
        C: Clone,
    {
        self.actions
            .iter()
            .fold(context.clone(), |ctx, action| action(&ctx, signal))
    }
}

impl<S: State, C, E> Clone for TransitionCandidate<S, C, E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            guard: self.guard.clone(),
            actions: self.actions.clone(),
        }
    }
}
