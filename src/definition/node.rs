//! State nodes: the transitions, invocation and timers of one state.

use crate::core::{State, Trigger};
use crate::effects::{Invocation, TransitionCandidate};
use std::collections::HashMap;
use std::time::Duration;

/// Behaviour attached to a single state.
pub struct StateNode<S: State, C, E, Env> {
    pub(crate) transitions: HashMap<Trigger, Vec<TransitionCandidate<S, C, E>>>,
    pub(crate) invocation: Option<Invocation<C, Env>>,
}

impl<S: State, C, E, Env> StateNode<S, C, E, Env> {
    pub(crate) fn new() -> Self {
        Self {
            transitions: HashMap::new(),
            invocation: None,
        }
    }

    /// Candidates for `trigger`, in declaration order.
    pub fn candidates(&self, trigger: &Trigger) -> &[TransitionCandidate<S, C, E>] {
        self.transitions
            .get(trigger)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn invocation(&self) -> Option<&Invocation<C, Env>> {
        self.invocation.as_ref()
    }

    /// Delays armed on entry, shortest first.
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays: Vec<Duration> = self
            .transitions
            .keys()
            .filter_map(|trigger| match trigger {
                Trigger::After(delay) => Some(*delay),
                _ => None,
            })
            .collect();
        delays.sort();
        delays
    }

    /// Whether this node reacts to `trigger` at all.
    pub fn handles(&self, trigger: &Trigger) -> bool {
        !self.candidates(trigger).is_empty()
    }

    /// Every (trigger, target) pair declared on this node.
    pub fn targets(&self) -> impl Iterator<Item = (&Trigger, &S)> {
        self.transitions.iter().flat_map(|(trigger, candidates)| {
            candidates
                .iter()
                .map(move |candidate| (trigger, &candidate.target))
        })
    }
}
