//! Transitions, the transition engine and invocations.
//!
//! This module is the boundary between the pure core and the effectful shell:
//! the engine computes transitions without side effects, while invocations
//! describe the asynchronous work an actor performs on state entry.
//!
//! # Zero-Cost Abstractions
//!
//! Following Stillwater 0.11.0 conventions:
//! - Invocation factories store `BoxedEffect` (one allocation per entry)
//! - Use free-standing constructors: `pure()`, `fail()`, `from_fn()`

pub mod engine;
pub mod invocation;
pub mod transition;

pub use engine::{step, StepResult};
pub use invocation::{Invocation, InvocationSource};
pub use transition::{assign, produce, Action, TransitionCandidate};
