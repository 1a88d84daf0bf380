//! Guard predicates for controlling state transitions.
//!
//! Guards are pure boolean functions of the current context and the incoming
//! signal. A guard that cannot decide should answer `false`; it must never
//! panic.

use super::event::Signal;
use std::sync::Arc;

type Predicate<C, E> = dyn Fn(&C, &Signal<E>) -> bool + Send + Sync;

/// Pure predicate that determines if a transition candidate applies.
///
/// # Example
///
/// ```rust
/// use statecraft::core::{Event, Guard, Signal};
///
/// #[derive(Clone, Debug)]
/// struct Depart;
///
/// impl Event for Depart {
///     fn name(&self) -> &str { "DEPART" }
/// }
///
/// struct Train { fuel: u32 }
///
/// let enough_fuel = Guard::new(|train: &Train, _: &Signal<Depart>| train.fuel >= 10);
///
/// assert!(enough_fuel.check(&Train { fuel: 90 }, &Signal::Event(Depart)));
/// assert!(!enough_fuel.check(&Train { fuel: 5 }, &Signal::Event(Depart)));
/// ```
pub struct Guard<C, E> {
    predicate: Arc<Predicate<C, E>>,
}

impl<C, E> Guard<C, E> {
    /// Create a guard from a pure predicate function.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C, &Signal<E>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Guard that only looks at the context.
    pub fn context<F>(predicate: F) -> Self
    where
        C: 'static,
        E: 'static,
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self::new(move |context, _| predicate(context))
    }

    /// Check if the guard allows the transition.
    pub fn check(&self, context: &C, signal: &Signal<E>) -> bool {
        (self.predicate)(context, signal)
    }

    /// Guard that passes only when both guards pass.
    pub fn and(self, other: Guard<C, E>) -> Self
    where
        C: 'static,
        E: 'static,
    {
        Self::new(move |context, signal| {
            self.check(context, signal) && other.check(context, signal)
        })
    }

    /// Guard that passes when this one does not.
    pub fn negate(self) -> Self
    where
        C: 'static,
        E: 'static,
    {
        Self::new(move |context, signal| !self.check(context, signal))
    }
}

impl<C, E> Clone for Guard<C, E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}
