//! Builder for constructing transition candidates.

use crate::builder::error::BuildError;
use crate::core::{Guard, Signal, State};
use crate::effects::transition::{assign, produce, Action};
use crate::effects::TransitionCandidate;
use std::sync::Arc;

/// Builder for constructing transition candidates with a fluent API.
pub struct TransitionBuilder<S: State, C, E> {
    target: Option<S>,
    guard: Option<Guard<C, E>>,
    actions: Vec<Action<C, E>>,
}

impl<S: State, C: Clone + 'static, E: 'static> TransitionBuilder<S, C, E> {
    pub fn new() -> Self {
        Self {
            target: None,
            guard: None,
            actions: Vec::new(),
        }
    }

    /// Set the target state (required).
    pub fn target(mut self, state: S) -> Self {
        self.target = Some(state);
        self
    }

    /// Add a guard (optional).
    ///
    /// Calling this twice requires both guards to pass.
    pub fn guard(mut self, guard: Guard<C, E>) -> Self {
        self.guard = Some(match self.guard.take() {
            Some(existing) => existing.and(guard),
            None => guard,
        });
        self
    }

    /// Add a guard using a closure over context and signal.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&C, &Signal<E>) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    /// Append a prebuilt action.
    pub fn action(mut self, action: Action<C, E>) -> Self {
        self.actions.push(action);
        self
    }

    /// Append an action that edits a draft of the context.
    pub fn assign<F>(self, recipe: F) -> Self
    where
        F: Fn(&mut C, &Signal<E>) + Send + Sync + 'static,
    {
        self.action(assign(recipe))
    }

    /// Append an action that returns a whole new context.
    pub fn produce<F>(self, recipe: F) -> Self
    where
        F: Fn(&C, &Signal<E>) -> C + Send + Sync + 'static,
    {
        self.action(produce(recipe))
    }

    /// Build the candidate. `state` and `trigger` only label the error.
    pub(crate) fn build(
        self,
        state: &str,
        trigger: &str,
    ) -> Result<TransitionCandidate<S, C, E>, BuildError> {
        let target = self.target.ok_or_else(|| BuildError::MissingTarget {
            state: state.to_string(),
            trigger: trigger.to_string(),
        })?;

        Ok(TransitionCandidate {
            target,
            guard: self.guard,
            actions: self.actions,
        })
    }
}

impl<S: State, C: Clone + 'static, E: 'static> Default for TransitionBuilder<S, C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, C, E> Clone for TransitionBuilder<S, C, E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            guard: self.guard.clone(),
            actions: self.actions.iter().map(Arc::clone).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Event;

    crate::state_enum! {
        enum Gate {
            Shut => "shut",
            Open => "open",
        }
    }

    #[derive(Clone, Debug)]
    struct Coin(u32);

    impl Event for Coin {
        fn name(&self) -> &str {
            "COIN"
        }
    }

    fn coin(value: u32) -> Signal<Coin> {
        Signal::Event(Coin(value))
    }

    #[test]
    fn missing_target_is_reported_with_location() {
        let result = TransitionBuilder::<Gate, u32, Coin>::new().build("shut", "COIN");

        match result {
            Err(BuildError::MissingTarget { state, trigger }) => {
                assert_eq!(state, "shut");
                assert_eq!(trigger, "COIN");
            }
            _ => panic!("Expected MissingTarget"),
        }
    }

    #[test]
    fn repeated_guards_are_conjoined() {
        let candidate = TransitionBuilder::<Gate, u32, Coin>::new()
            .target(Gate::Open)
            .when(|_, signal| matches!(signal, Signal::Event(Coin(v)) if *v >= 25))
            .when(|credit, _| *credit < 100)
            .build("shut", "COIN")
            .unwrap();

        assert!(candidate.applies(&0, &coin(25)));
        assert!(!candidate.applies(&0, &coin(10)));
        assert!(!candidate.applies(&100, &coin(25)));
    }

    #[test]
    fn actions_keep_declaration_order() {
        let candidate = TransitionBuilder::<Gate, u32, Coin>::new()
            .target(Gate::Open)
            .assign(|credit, signal| {
                if let Some(Coin(v)) = signal.event() {
                    *credit += v;
                }
            })
            .produce(|credit, _| credit * 2)
            .build("shut", "COIN")
            .unwrap();

        assert_eq!(candidate.apply(&5, &coin(10)), 30);
        assert_eq!(candidate.target, Gate::Open);
    }
}
