//! Running machine instances.
//!
//! An [`Actor`] owns one live instance of a [`MachineDefinition`]: its current
//! snapshot, a FIFO mailbox, the timers and invocation armed by the current
//! state, and the listeners subscribed to it.
//!
//! Events are processed strictly one at a time. Whoever finds the mailbox idle
//! drains it synchronously; events sent while a drain is underway (including
//! from inside a listener) are queued behind it. Timers and invocations run on
//! the tokio runtime that was current when the actor started and re-enter the
//! mailbox as synthetic signals tagged with the entry generation that armed
//! them. Leaving a state bumps the generation, so completions that arrive late
//! are recognised and discarded without touching the snapshot.

mod config;
mod error;
mod snapshot;
mod subscription;

pub use config::ActorConfig;
pub use error::ActorError;
pub use snapshot::{ErrorInfo, Snapshot, SnapshotViolation, Status};
pub use subscription::Subscription;

use crate::checkpoint::Checkpoint;
use crate::core::{Context, Event, InvocationError, Signal, State, StateHistory, StateTransition};
use crate::definition::MachineDefinition;
use crate::effects::{step, StepResult};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;
use stillwater::effect::Effect;
use stillwater::validation::Validation;
use subscription::Detach;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info, trace, warn};

type Listener<S, C> = Arc<dyn Fn(&Snapshot<S, C>) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    NotStarted,
    Running,
    /// Reached a final state or failed without a handler
    Halted,
    Stopped,
}

/// Releases the drain flag when a listener, guard or action unwinds out of
/// [`Actor::drain`], so later events still get processed.
struct DrainReset<'a, S: State, C: Context, E> {
    cell: &'a Mutex<Cell<S, C, E>>,
    actor: &'a str,
}

impl<S: State, C: Context, E> Drop for DrainReset<'_, S, C, E> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.cell.lock().processing = false;
            warn!(actor = self.actor, "drain interrupted by a panic");
        }
    }
}

enum Envelope<E> {
    External(E),
    Internal { generation: u64, signal: Signal<E> },
}

struct Cell<S: State, C: Context, E> {
    lifecycle: Lifecycle,
    snapshot: Snapshot<S, C>,
    history: StateHistory<S>,
    mailbox: VecDeque<Envelope<E>>,
    processing: bool,
    subscribers: Vec<(u64, Listener<S, C>)>,
    next_subscriber: u64,
    generation: u64,
    pending: Vec<AbortHandle>,
    runtime: Option<Handle>,
}

impl<S: State, C: Context, E> Cell<S, C, E> {
    /// Invalidate and cancel everything armed by the current state entry.
    fn cancel_pending(&mut self) {
        self.generation += 1;
        for task in self.pending.drain(..) {
            task.abort();
        }
    }
}

struct Shared<S: State, C: Context, E: Event, Env> {
    definition: Arc<MachineDefinition<S, C, E, Env>>,
    env: Env,
    config: ActorConfig,
    cell: Mutex<Cell<S, C, E>>,
}

impl<S: State, C: Context, E: Event, Env: Send + Sync> Detach for Shared<S, C, E, Env> {
    fn detach(&self, id: u64) {
        self.cell.lock().subscribers.retain(|(sub, _)| *sub != id);
    }
}

impl<S: State, C: Context, E: Event, Env> Drop for Shared<S, C, E, Env> {
    fn drop(&mut self) {
        self.cell.get_mut().cancel_pending();
    }
}

/// Handle to a running machine instance. Clones share the same instance.
///
/// # Example
///
/// ```rust
/// use statecraft::actor::{Actor, ActorConfig, Status};
/// use statecraft::builder::{MachineBuilder, StateBuilder};
/// use statecraft::core::Event;
/// use std::sync::Arc;
///
/// statecraft::state_enum! {
///     enum Light {
///         Off => "off",
///         On => "on",
///     }
/// }
///
/// #[derive(Clone, Debug)]
/// struct Toggle;
///
/// impl Event for Toggle {
///     fn name(&self) -> &str {
///         "TOGGLE"
///     }
/// }
///
/// let definition = MachineBuilder::<Light, u32, Toggle>::new("light")
///     .initial(Light::Off)
///     .context(0u32)
///     .state(Light::Off, StateBuilder::new().on("TOGGLE", Light::On))
///     .state(Light::On, StateBuilder::new().on("TOGGLE", Light::Off))
///     .build()
///     .unwrap();
///
/// let actor = Actor::new(Arc::new(definition), (), ActorConfig::default());
/// actor.start().unwrap();
/// actor.send(Toggle).unwrap();
///
/// let snapshot = actor.get_snapshot();
/// assert_eq!(snapshot.value, Light::On);
/// assert_eq!(snapshot.status, Status::Active);
/// ```
pub struct Actor<S: State, C: Context, E: Event, Env = ()> {
    shared: Arc<Shared<S, C, E, Env>>,
}

impl<S: State, C: Context, E: Event, Env> Clone for Actor<S, C, E, Env> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, C, E, Env> Actor<S, C, E, Env>
where
    S: State,
    C: Context,
    E: Event,
    Env: Clone + Send + Sync + 'static,
{
    /// Create an actor sitting in the definition's initial state and context.
    /// Nothing runs until [`start`](Self::start).
    pub fn new(
        definition: Arc<MachineDefinition<S, C, E, Env>>,
        env: Env,
        config: ActorConfig,
    ) -> Self {
        let snapshot = Snapshot::at(
            definition.initial_state().clone(),
            definition.initial_context().clone(),
        );
        Self::assemble(definition, env, config, snapshot, StateHistory::new())
    }

    /// Create an actor that continues from `snapshot` instead of the initial
    /// state. A stopped snapshot comes back active.
    pub fn from_snapshot(
        definition: Arc<MachineDefinition<S, C, E, Env>>,
        env: Env,
        config: ActorConfig,
        snapshot: Snapshot<S, C>,
    ) -> Result<Self, ActorError> {
        Self::restore(definition, env, config, snapshot, StateHistory::new())
    }

    /// Create an actor from a checkpoint taken from the same machine,
    /// carrying its history forward.
    pub fn resume(
        definition: Arc<MachineDefinition<S, C, E, Env>>,
        env: Env,
        config: ActorConfig,
        checkpoint: Checkpoint<S, C>,
    ) -> Result<Self, ActorError> {
        checkpoint.ensure_machine(definition.id())?;
        Self::restore(
            definition,
            env,
            config,
            checkpoint.snapshot,
            checkpoint.history,
        )
    }

    fn restore(
        definition: Arc<MachineDefinition<S, C, E, Env>>,
        env: Env,
        config: ActorConfig,
        mut snapshot: Snapshot<S, C>,
        history: StateHistory<S>,
    ) -> Result<Self, ActorError> {
        if !definition.contains(&snapshot.value) {
            return Err(ActorError::UnknownState {
                state: snapshot.value.name().to_string(),
                machine: definition.id().to_string(),
            });
        }

        if let Validation::Failure(violations) = snapshot.validate() {
            return Err(ActorError::InvalidSnapshot(
                violations.iter().cloned().collect(),
            ));
        }

        if snapshot.status == Status::Stopped {
            snapshot.status = Status::for_state(&snapshot.value);
        }

        Ok(Self::assemble(definition, env, config, snapshot, history))
    }

    fn assemble(
        definition: Arc<MachineDefinition<S, C, E, Env>>,
        env: Env,
        config: ActorConfig,
        snapshot: Snapshot<S, C>,
        history: StateHistory<S>,
    ) -> Self {
        let cell = Cell {
            lifecycle: Lifecycle::NotStarted,
            snapshot,
            history,
            mailbox: VecDeque::new(),
            processing: false,
            subscribers: Vec::new(),
            next_subscriber: 0,
            generation: 0,
            pending: Vec::new(),
            runtime: None,
        };

        Self {
            shared: Arc::new(Shared {
                definition,
                env,
                config,
                cell: Mutex::new(cell),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.shared.config.id
    }

    pub fn definition(&self) -> &MachineDefinition<S, C, E, Env> {
        &self.shared.definition
    }

    /// Enter the current state, arming its timers and invocation, then
    /// process any events sent before starting.
    ///
    /// Fails if the actor was started before, or if the machine has timers or
    /// invocations and no tokio runtime is current.
    pub fn start(&self) -> Result<(), ActorError> {
        {
            let mut cell = self.shared.cell.lock();

            if cell.lifecycle != Lifecycle::NotStarted {
                return Err(ActorError::AlreadyStarted {
                    id: self.id().to_string(),
                });
            }

            cell.runtime = match Handle::try_current() {
                Ok(handle) => Some(handle),
                Err(_) if self.shared.definition.requires_runtime() => {
                    return Err(ActorError::NoRuntime)
                }
                Err(_) => None,
            };

            info!(
                actor = self.id(),
                machine = self.shared.definition.id(),
                state = cell.snapshot.value.name(),
                "actor started"
            );

            if !cell.snapshot.can_continue() {
                cell.lifecycle = Lifecycle::Halted;
                cell.mailbox.clear();
                cell.subscribers.clear();
                return Ok(());
            }

            cell.lifecycle = Lifecycle::Running;
            let current = cell.snapshot.value.clone();
            self.enter(&mut cell, &current);

            if cell.mailbox.is_empty() || cell.processing {
                return Ok(());
            }
            cell.processing = true;
        }

        self.drain();
        Ok(())
    }

    /// Queue `event` for processing.
    ///
    /// Before [`start`](Self::start) the event is buffered. Once the actor
    /// has halted or been stopped the event is rejected.
    pub fn send(&self, event: E) -> Result<(), ActorError> {
        self.enqueue(Envelope::External(event))
    }

    /// Cancel pending work, discard queued events and halt with status
    /// `stopped`. Listeners receive the final snapshot and are detached.
    ///
    /// Stopping an actor that already stopped is a no-op. An actor that
    /// halted on its own keeps its `done` or `errored` status.
    pub fn stop(&self) {
        let (snapshot, listeners) = {
            let mut cell = self.shared.cell.lock();

            match cell.lifecycle {
                Lifecycle::Stopped => return,
                Lifecycle::Halted => {
                    cell.lifecycle = Lifecycle::Stopped;
                    cell.subscribers.clear();
                    return;
                }
                Lifecycle::NotStarted | Lifecycle::Running => {}
            }

            cell.cancel_pending();
            cell.mailbox.clear();
            cell.lifecycle = Lifecycle::Stopped;
            cell.snapshot.status = Status::Stopped;

            info!(
                actor = self.id(),
                state = cell.snapshot.value.name(),
                "actor stopped"
            );

            // the drain in progress publishes and detaches once it notices
            if cell.processing {
                return;
            }

            (cell.snapshot.clone(), std::mem::take(&mut cell.subscribers))
        };

        for (_, listener) in &listeners {
            listener(&snapshot);
        }
    }

    /// Register `listener`. It is called immediately with the current
    /// snapshot and then after every processed event, including events that
    /// changed nothing, until it unsubscribes or the actor halts.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot<S, C>) + Send + Sync + 'static,
    {
        let listener: Listener<S, C> = Arc::new(listener);

        let (snapshot, id) = {
            let mut cell = self.shared.cell.lock();
            let id = match cell.lifecycle {
                Lifecycle::Halted | Lifecycle::Stopped => None,
                Lifecycle::NotStarted | Lifecycle::Running => {
                    cell.next_subscriber += 1;
                    let id = cell.next_subscriber;
                    cell.subscribers.push((id, Arc::clone(&listener)));
                    Some(id)
                }
            };
            (cell.snapshot.clone(), id)
        };

        listener(&snapshot);

        match id {
            Some(id) => {
                let shared: Weak<Shared<S, C, E, Env>> = Arc::downgrade(&self.shared);
                let source: Weak<dyn Detach> = shared;
                Subscription::attached(source, id)
            }
            None => Subscription::detached(),
        }
    }

    pub fn get_snapshot(&self) -> Snapshot<S, C> {
        self.shared.cell.lock().snapshot.clone()
    }

    pub fn status(&self) -> Status {
        self.shared.cell.lock().snapshot.status
    }

    /// Transitions committed so far (empty when history is disabled).
    pub fn history(&self) -> StateHistory<S> {
        self.shared.cell.lock().history.clone()
    }

    /// Capture the snapshot and history for a later [`resume`](Self::resume).
    pub fn checkpoint(&self) -> Checkpoint<S, C> {
        let cell = self.shared.cell.lock();
        Checkpoint::new(
            self.shared.definition.id(),
            self.id(),
            cell.snapshot.clone(),
            cell.history.clone(),
        )
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// The current snapshot is checked first. Fails with
    /// [`ActorError::Timeout`] if nothing matches within `timeout`, or with
    /// [`ActorError::NotRunning`] if the actor halts without a match.
    pub async fn wait_for<P>(
        &self,
        predicate: P,
        timeout: Duration,
    ) -> Result<Snapshot<S, C>, ActorError>
    where
        P: Fn(&Snapshot<S, C>) -> bool + Send + Sync + 'static,
    {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let subscription = self.subscribe(move |snapshot| {
            if predicate(snapshot) {
                let _ = tx.send(snapshot.clone());
            }
        });

        let outcome = tokio::time::timeout(timeout, rx.recv()).await;
        subscription.unsubscribe();

        match outcome {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => Err(ActorError::NotRunning {
                id: self.id().to_string(),
                status: self.status(),
            }),
            Err(_) => Err(ActorError::Timeout { timeout }),
        }
    }

    fn enqueue(&self, envelope: Envelope<E>) -> Result<(), ActorError> {
        {
            let mut cell = self.shared.cell.lock();

            match cell.lifecycle {
                Lifecycle::Halted | Lifecycle::Stopped => {
                    return match envelope {
                        Envelope::External(event) => {
                            trace!(actor = self.id(), event = event.name(), "event rejected");
                            Err(ActorError::NotRunning {
                                id: self.id().to_string(),
                                status: cell.snapshot.status,
                            })
                        }
                        Envelope::Internal { .. } => Ok(()),
                    };
                }
                Lifecycle::NotStarted => {
                    cell.mailbox.push_back(envelope);
                    return Ok(());
                }
                Lifecycle::Running => cell.mailbox.push_back(envelope),
            }

            if cell.processing {
                return Ok(());
            }
            cell.processing = true;
        }

        self.drain();
        Ok(())
    }

    /// Process queued envelopes until the mailbox is empty, publishing after
    /// each one with the lock released.
    fn drain(&self) {
        let _reset = DrainReset {
            cell: &self.shared.cell,
            actor: self.id(),
        };

        loop {
            let (snapshot, listeners, finished) = {
                let mut cell = self.shared.cell.lock();

                if cell.lifecycle != Lifecycle::Running {
                    cell.mailbox.clear();
                    cell.processing = false;
                    let listeners = std::mem::take(&mut cell.subscribers);
                    (cell.snapshot.clone(), listeners, true)
                } else {
                    let Some(envelope) = cell.mailbox.pop_front() else {
                        cell.processing = false;
                        return;
                    };

                    if !self.process(&mut cell, envelope) {
                        continue;
                    }

                    if cell.lifecycle == Lifecycle::Running {
                        (cell.snapshot.clone(), cell.subscribers.clone(), false)
                    } else {
                        cell.mailbox.clear();
                        cell.processing = false;
                        let listeners = std::mem::take(&mut cell.subscribers);
                        (cell.snapshot.clone(), listeners, true)
                    }
                }
            };

            for (_, listener) in &listeners {
                listener(&snapshot);
            }

            if finished {
                return;
            }
        }
    }

    /// Apply one envelope to the cell. Returns false for stale completions,
    /// which are dropped without publishing.
    fn process(&self, cell: &mut Cell<S, C, E>, envelope: Envelope<E>) -> bool {
        let signal = match envelope {
            Envelope::External(event) => Signal::Event(event),
            Envelope::Internal { generation, signal } if generation != cell.generation => {
                debug!(
                    actor = self.id(),
                    trigger = %signal.trigger(),
                    "discarding stale completion"
                );
                return false;
            }
            Envelope::Internal { signal, .. } => signal,
        };

        let current = cell.snapshot.value.clone();
        let trigger = signal.trigger();
        let Some(node) = self.shared.definition.node(&current) else {
            return false;
        };

        match step(node, &cell.snapshot.context, &signal) {
            StepResult::Transitioned { target, context } => {
                debug!(
                    actor = self.id(),
                    from = current.name(),
                    to = target.name(),
                    trigger = %trigger,
                    "transition"
                );

                cell.cancel_pending();

                if self.shared.config.record_history {
                    let history = cell.history.record(StateTransition {
                        from: current,
                        to: target.clone(),
                        trigger: trigger.to_string(),
                        timestamp: Utc::now(),
                    });
                    cell.history = match self.shared.config.history_limit {
                        Some(limit) => history.retain_last(limit),
                        None => history,
                    };
                }

                cell.snapshot = Snapshot::at(target.clone(), context);
                self.enter(cell, &target);
            }
            StepResult::Ignored => match signal {
                Signal::Error { error } => {
                    warn!(
                        actor = self.id(),
                        state = current.name(),
                        error = %error,
                        "invocation failed with no error transition"
                    );

                    cell.cancel_pending();
                    cell.snapshot.status = Status::Errored;
                    cell.snapshot.error = Some(ErrorInfo {
                        message: error.message().to_string(),
                        state: current.name().to_string(),
                    });
                    cell.lifecycle = Lifecycle::Halted;
                }
                _ => trace!(
                    actor = self.id(),
                    state = current.name(),
                    trigger = %trigger,
                    "no transition"
                ),
            },
        }

        true
    }

    /// Run entry behaviour for `state`: halt on a final state, otherwise arm
    /// its delayed transitions and start its invocation.
    fn enter(&self, cell: &mut Cell<S, C, E>, state: &S) {
        if state.is_final() {
            cell.lifecycle = Lifecycle::Halted;
            info!(actor = self.id(), state = state.name(), "actor reached final state");
            return;
        }

        let Some(node) = self.shared.definition.node(state) else {
            return;
        };

        let delays = node.delays();
        let invocation = node.invocation();
        if delays.is_empty() && invocation.is_none() {
            return;
        }

        let Some(runtime) = cell.runtime.clone() else {
            warn!(
                actor = self.id(),
                state = state.name(),
                "no runtime to arm timers and invocations"
            );
            return;
        };

        let generation = cell.generation;

        for delay in delays {
            let shared = Arc::downgrade(&self.shared);
            let timer = runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                Self::deliver(&shared, generation, Signal::After { delay });
            });
            cell.pending.push(timer.abort_handle());
        }

        if let Some(invocation) = invocation {
            debug!(
                actor = self.id(),
                state = state.name(),
                invocation = invocation.id(),
                "invocation started"
            );

            let effect = invocation.prepare(&cell.snapshot.context);
            let env = self.shared.env.clone();
            let work = runtime.spawn(async move { effect.run(&env).await });
            cell.pending.push(work.abort_handle());

            let shared = Arc::downgrade(&self.shared);
            let relay = runtime.spawn(async move {
                let signal = match work.await {
                    Ok(Ok(output)) => Signal::Done { output },
                    Ok(Err(error)) => Signal::Error { error },
                    Err(join) => Signal::Error {
                        error: InvocationError::Panicked {
                            message: join.to_string(),
                        },
                    },
                };
                Self::deliver(&shared, generation, signal);
            });
            cell.pending.push(relay.abort_handle());
        }
    }

    fn deliver(shared: &Weak<Shared<S, C, E, Env>>, generation: u64, signal: Signal<E>) {
        if let Some(shared) = shared.upgrade() {
            let actor = Self { shared };
            let _ = actor.enqueue(Envelope::Internal { generation, signal });
        }
    }
}
