//! Asynchronous units of work bound to a state.
//!
//! An invocation is a factory: on every entry into its state it builds a fresh
//! effect from the context captured at that moment. The actor runs the effect
//! with its environment and feeds the outcome back as a `Done` or `Error`
//! signal.

use crate::core::InvocationError;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;
use stillwater::prelude::*;

/// Factory producing the effect to run for one entry into a state.
pub type InvocationSource<C, Env> =
    Arc<dyn Fn(&C) -> BoxedEffect<Value, InvocationError, Env> + Send + Sync>;

/// Named invocation attached to a state node.
pub struct Invocation<C, Env> {
    id: String,
    source: InvocationSource<C, Env>,
}

impl<C, Env> Invocation<C, Env>
where
    C: Clone + Send + Sync + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Create an invocation from an effect factory.
    pub fn new<F>(id: impl Into<String>, source: F) -> Self
    where
        F: Fn(&C) -> BoxedEffect<Value, InvocationError, Env> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            source: Arc::new(source),
        }
    }

    /// Create an invocation from a plain function of the captured context
    /// and the actor's environment.
    pub fn from_step<F>(id: impl Into<String>, step: F) -> Self
    where
        F: Fn(&C, &Env) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        let step = Arc::new(step);
        Self::new(id, move |context: &C| {
            let step = Arc::clone(&step);
            let context = context.clone();
            from_fn(move |env: &Env| step(&context, env)).boxed()
        })
    }

    /// Create an invocation from an async function that owns a copy of the
    /// captured context and of the environment.
    ///
    /// Use this for work that waits on I/O; the step suspends instead of
    /// holding a runtime worker.
    pub fn from_async<F, Fut>(id: impl Into<String>, step: F) -> Self
    where
        F: Fn(C, Env) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, InvocationError>> + Send + 'static,
    {
        let step = Arc::new(step);
        Self::new(id, move |context: &C| {
            let step = Arc::clone(&step);
            let context = context.clone();
            from_async(move |env: &Env| step(context, env.clone())).boxed()
        })
    }

    /// Invocation that resolves immediately with `output`.
    pub fn resolve(id: impl Into<String>, output: Value) -> Self {
        Self::new(id, move |_: &C| pure(output.clone()).boxed())
    }

    /// Invocation that fails immediately with `error`.
    pub fn reject(id: impl Into<String>, error: InvocationError) -> Self {
        Self::new(id, move |_: &C| fail(error.clone()).boxed())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Build the effect for one entry, capturing `context` by value.
    pub fn prepare(&self, context: &C) -> BoxedEffect<Value, InvocationError, Env> {
        (self.source)(context)
    }
}

impl<C, Env> Clone for Invocation<C, Env> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            source: Arc::clone(&self.source),
        }
    }
}
