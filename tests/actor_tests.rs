//! Actor runtime behaviour: invocations, delayed transitions, cancellation
//! and waiting on snapshots.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statecraft::actor::{Actor, ActorConfig, ActorError, Snapshot, Status};
use statecraft::builder::{transition, MachineBuilder, StateBuilder};
use statecraft::core::{Event, InvocationError, Signal};
use statecraft::definition::MachineDefinition;
use statecraft::effects::Invocation;
use statecraft::pipeline::{
    job_pipeline_with_services, JobContext, JobEvent, JobServices, JobState,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

const PATIENCE: Duration = Duration::from_secs(2);

/// Services that fail the first `upload_failures` uploads.
#[derive(Default)]
struct Studio {
    upload_failures: AtomicUsize,
    create_delay: Option<Duration>,
    creates: AtomicUsize,
    uploads: AtomicUsize,
    emails: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl JobServices for Studio {
    async fn create_asset(&self) -> Result<String, String> {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        let n = self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(format!("asset-{}", n + 1))
    }

    async fn upload_asset(&self, asset_id: &str) -> Result<String, String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let remaining = self.upload_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.upload_failures.store(remaining - 1, Ordering::SeqCst);
            return Err("bucket unavailable".to_string());
        }
        Ok(format!("https://cdn.example/{}", asset_id))
    }

    async fn email_client(&self, asset_id: &str, upload_url: &str) -> Result<(), String> {
        self.emails
            .lock()
            .unwrap()
            .push((asset_id.to_string(), upload_url.to_string()));
        Ok(())
    }
}

fn studio_job(studio: &Arc<Studio>) -> Actor<JobState, JobContext, JobEvent, Arc<Studio>> {
    let definition = job_pipeline_with_services::<Arc<Studio>>().unwrap();
    Actor::new(Arc::new(definition), Arc::clone(studio), ActorConfig::default())
}

statecraft::state_enum! {
    enum Query {
        Idle => "idle",
        Waiting => "waiting",
        Answered => "answered",
        TimedOut => "timedOut",
        Cancelled => "cancelled",
        Failed => "failed",
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Reply {
    answer: Option<String>,
    failure: Option<String>,
    attempts: u32,
}

#[derive(Clone, Debug)]
enum Control {
    Cancel,
    Again,
}

impl Event for Control {
    fn name(&self) -> &str {
        match self {
            Self::Cancel => "CANCEL",
            Self::Again => "AGAIN",
        }
    }
}

type QueryDefinition = MachineDefinition<Query, Reply, Control>;

/// `waiting` runs `invocation`, times out after `timeout`, and can be
/// cancelled or re-entered from outside.
fn query(
    invocation: Invocation<Reply, ()>,
    timeout: Duration,
    handle_errors: bool,
) -> Arc<QueryDefinition> {
    let mut waiting = StateBuilder::new()
        .invoke(invocation)
        .on_done(transition(Query::Answered).assign(
            |reply: &mut Reply, signal: &Signal<Control>| {
                reply.answer = signal
                    .output()
                    .and_then(|o| o.as_str())
                    .map(str::to_string);
            },
        ))
        .after(timeout, Query::TimedOut)
        .on("CANCEL", Query::Cancelled)
        .on_with(
            "AGAIN",
            transition(Query::Waiting)
                .assign(|reply: &mut Reply, _: &Signal<Control>| reply.attempts += 1),
        );

    if handle_errors {
        waiting = waiting.on_error(transition(Query::Failed).assign(
            |reply: &mut Reply, signal: &Signal<Control>| {
                if let Signal::Error { error } = signal {
                    reply.failure = Some(error.message().to_string());
                }
            },
        ));
    }

    let definition = MachineBuilder::new("query")
        .initial(Query::Waiting)
        .context(Reply::default())
        .state(Query::Waiting, waiting)
        .state(Query::Answered, StateBuilder::new())
        .state(Query::TimedOut, StateBuilder::new())
        .state(Query::Cancelled, StateBuilder::new())
        .state(Query::Failed, StateBuilder::new())
        .build()
        .unwrap();
    Arc::new(definition)
}

fn answer(text: &'static str) -> Invocation<Reply, ()> {
    Invocation::from_step("answer", move |_: &Reply, _: &()| Ok(serde_json::json!(text)))
}

fn start(definition: Arc<QueryDefinition>) -> Actor<Query, Reply, Control> {
    let actor = Actor::new(definition, (), ActorConfig::default());
    actor.start().unwrap();
    actor
}

fn is(state: Query) -> impl Fn(&Snapshot<Query, Reply>) -> bool + Send + Sync + 'static {
    move |snapshot| snapshot.value == state
}

#[tokio::test]
async fn pipeline_runs_every_stage_through_services() {
    let studio = Arc::new(Studio::default());
    let actor = studio_job(&studio);
    actor.start().unwrap();

    actor.send(JobEvent::CreateAsset).unwrap();
    let done = actor
        .wait_for(|s| s.status == Status::Done, PATIENCE)
        .await
        .unwrap();

    assert_eq!(done.value, JobState::Done);
    assert_eq!(done.context.asset_id.as_deref(), Some("asset-1"));
    assert_eq!(
        done.context.upload_url.as_deref(),
        Some("https://cdn.example/asset-1")
    );
    assert!(done.context.email_sent);
    assert_eq!(
        *studio.emails.lock().unwrap(),
        vec![(
            "asset-1".to_string(),
            "https://cdn.example/asset-1".to_string()
        )]
    );
}

#[tokio::test]
async fn failed_upload_retries_without_recreating_the_asset() {
    let studio = Arc::new(Studio::default());
    studio.upload_failures.store(1, Ordering::SeqCst);
    let actor = studio_job(&studio);
    actor.start().unwrap();

    actor.send(JobEvent::CreateAsset).unwrap();
    let failed = actor
        .wait_for(|s| s.value == JobState::Error, PATIENCE)
        .await
        .unwrap();
    assert_eq!(failed.status, Status::Errored);
    assert_eq!(failed.error, None);
    assert_eq!(failed.context.error.as_deref(), Some("bucket unavailable"));
    assert_eq!(failed.context.asset_id.as_deref(), Some("asset-1"));

    actor.send(JobEvent::Retry).unwrap();
    let done = actor
        .wait_for(|s| s.status == Status::Done, PATIENCE)
        .await
        .unwrap();

    assert_eq!(done.context.error, None);
    assert_eq!(studio.creates.load(Ordering::SeqCst), 1);
    assert_eq!(studio.uploads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn resumed_snapshot_reruns_the_stage_invocation() {
    let studio = Arc::new(Studio::default());
    let definition = Arc::new(job_pipeline_with_services::<Arc<Studio>>().unwrap());
    let snapshot = Snapshot::at(
        JobState::UploadingAsset,
        JobContext {
            asset_id: Some("a1".to_string()),
            ..JobContext::default()
        },
    );

    let actor = Actor::from_snapshot(
        definition,
        Arc::clone(&studio),
        ActorConfig::default(),
        snapshot,
    )
    .unwrap();
    actor.start().unwrap();

    let done = actor
        .wait_for(|s| s.status == Status::Done, PATIENCE)
        .await
        .unwrap();
    assert_eq!(done.context.upload_url.as_deref(), Some("https://cdn.example/a1"));
    assert_eq!(studio.creates.load(Ordering::SeqCst), 0);
}

#[test]
fn machines_with_invocations_need_a_runtime() {
    let studio = Arc::new(Studio::default());
    let actor = studio_job(&studio);

    assert!(matches!(actor.start(), Err(ActorError::NoRuntime)));
}

#[tokio::test]
async fn slow_service_call_leaves_the_runtime_free() {
    let studio = Arc::new(Studio {
        create_delay: Some(Duration::from_millis(300)),
        ..Studio::default()
    });
    let actor = studio_job(&studio);
    actor.start().unwrap();
    actor.send(JobEvent::CreateAsset).unwrap();

    let started = Instant::now();
    let result = actor
        .wait_for(|s| s.value == JobState::UploadingAsset, Duration::from_millis(50))
        .await;

    assert!(matches!(result, Err(ActorError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_millis(250));
    assert_eq!(actor.get_snapshot().value, JobState::CreatingAsset);

    let done = actor
        .wait_for(|s| s.status == Status::Done, PATIENCE)
        .await
        .unwrap();
    assert_eq!(done.context.asset_id.as_deref(), Some("asset-1"));
}

#[tokio::test]
async fn invocation_output_drives_done_transition() {
    let actor = start(query(answer("42"), PATIENCE, true));

    let answered = actor.wait_for(is(Query::Answered), PATIENCE).await.unwrap();
    assert_eq!(answered.context.answer.as_deref(), Some("42"));
    assert_eq!(answered.status, Status::Active);
}

#[tokio::test]
async fn handled_failure_routes_through_error_transition() {
    let failing = Invocation::reject("answer", InvocationError::failed("no quorum"));
    let actor = start(query(failing, PATIENCE, true));

    let failed = actor.wait_for(is(Query::Failed), PATIENCE).await.unwrap();
    assert_eq!(failed.context.failure.as_deref(), Some("no quorum"));
    assert_eq!(failed.error, None);
}

#[tokio::test]
async fn unhandled_failure_halts_with_error_info() {
    let failing = Invocation::reject("answer", InvocationError::failed("no quorum"));
    let actor = start(query(failing, PATIENCE, false));

    let halted = actor
        .wait_for(|s| s.status == Status::Errored, PATIENCE)
        .await
        .unwrap();
    let error = halted.error.unwrap();
    assert_eq!(error.message, "no quorum");
    assert_eq!(error.state, "waiting");
    assert_eq!(halted.value, Query::Waiting);

    assert!(matches!(
        actor.send(Control::Cancel),
        Err(ActorError::NotRunning {
            status: Status::Errored,
            ..
        })
    ));
}

#[tokio::test]
async fn panicking_step_is_reported_as_failure() {
    let exploding = Invocation::from_step(
        "answer",
        |_: &Reply, _: &()| -> Result<serde_json::Value, InvocationError> {
            panic!("step exploded")
        },
    );
    let actor = start(query(exploding, PATIENCE, true));

    let failed = actor.wait_for(is(Query::Failed), PATIENCE).await.unwrap();
    assert!(failed.context.failure.is_some());
}

#[tokio::test]
async fn delayed_transition_fires_when_nothing_arrives() {
    let definition = MachineBuilder::new("quiet")
        .initial(Query::Waiting)
        .context(Reply::default())
        .state(
            Query::Waiting,
            StateBuilder::new().after(Duration::from_millis(20), Query::TimedOut),
        )
        .state(Query::TimedOut, StateBuilder::new())
        .build()
        .unwrap();
    let actor = start(Arc::new(definition));

    let timed_out = actor.wait_for(is(Query::TimedOut), PATIENCE).await.unwrap();
    assert_eq!(timed_out.value, Query::TimedOut);
    assert_eq!(actor.history().transitions()[0].trigger, "after.20ms");
}

#[tokio::test]
async fn leaving_a_state_disarms_its_timer() {
    let definition = MachineBuilder::new("cancellable")
        .initial(Query::Waiting)
        .context(Reply::default())
        .state(
            Query::Waiting,
            StateBuilder::new()
                .after(Duration::from_millis(30), Query::TimedOut)
                .on("CANCEL", Query::Cancelled),
        )
        .state(Query::TimedOut, StateBuilder::new())
        .state(Query::Cancelled, StateBuilder::new())
        .build()
        .unwrap();
    let actor = start(Arc::new(definition));

    actor.send(Control::Cancel).unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(actor.get_snapshot().value, Query::Cancelled);
    assert_eq!(actor.history().transitions().len(), 1);
}

#[tokio::test]
async fn leaving_before_the_invocation_runs_cancels_it() {
    let actor = start(query(answer("too late"), PATIENCE, true));
    let published = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&published);
    let _subscription = actor.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // leave before the runtime gets a chance to run the invocation
    actor.send(Control::Cancel).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = actor.get_snapshot();
    assert_eq!(snapshot.value, Query::Cancelled);
    assert_eq!(snapshot.context.answer, None);
    assert_eq!(published.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn completion_arriving_after_exit_is_discarded() {
    let (finished_tx, finished_rx) = mpsc::channel();
    let finished_tx = Mutex::new(finished_tx);
    let finished_rx = Mutex::new(finished_rx);
    let invocation = Invocation::from_step("answer", move |_: &Reply, _: &()| {
        let _ = finished_tx.lock().unwrap().send(());
        Ok(serde_json::json!("too late"))
    });

    let definition = MachineBuilder::new("late")
        .initial(Query::Idle)
        .context(Reply::default())
        .state(Query::Idle, StateBuilder::new().on("AGAIN", Query::Waiting))
        .state(
            Query::Waiting,
            StateBuilder::new()
                .invoke(invocation)
                .on_done(transition(Query::Answered))
                .on("CANCEL", Query::Cancelled),
        )
        .state(Query::Answered, StateBuilder::new())
        .state(Query::Cancelled, StateBuilder::new())
        .build()
        .unwrap();
    let actor = start(Arc::new(definition));

    // While the entry into `waiting` is still being published, queue CANCEL
    // and hold the drain until the step has finished and its completion is
    // queued behind it.
    let finished = Arc::new(AtomicBool::new(false));
    let observed = Arc::clone(&finished);
    let published = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&published);
    let inner = actor.clone();
    let _subscription = actor.subscribe(move |s| {
        counter.fetch_add(1, Ordering::SeqCst);
        if s.value == Query::Waiting {
            inner.send(Control::Cancel).unwrap();
            if finished_rx.lock().unwrap().recv_timeout(PATIENCE).is_ok() {
                observed.store(true, Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    });

    actor.send(Control::Again).unwrap();

    assert!(finished.load(Ordering::SeqCst));
    let snapshot = actor.get_snapshot();
    assert_eq!(snapshot.value, Query::Cancelled);
    assert_eq!(snapshot.context.answer, None);
    assert_eq!(published.load(Ordering::SeqCst), 3);
    assert_eq!(actor.history().transitions().len(), 2);
    actor.stop();
}

#[tokio::test]
async fn self_transition_restarts_the_invocation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let invocation = Invocation::from_step("answer", move |reply: &Reply, _: &()| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::json!(format!("attempt {}", reply.attempts)))
    });
    let actor = start(query(invocation, PATIENCE, true));

    // re-enter twice before the first invocation can complete
    actor.send(Control::Again).unwrap();
    actor.send(Control::Again).unwrap();

    let answered = actor.wait_for(is(Query::Answered), PATIENCE).await.unwrap();
    assert_eq!(answered.context.answer.as_deref(), Some("attempt 2"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stop_cancels_pending_work() {
    let actor = start(query(answer("ignored"), Duration::from_millis(10), true));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = actor.subscribe(move |s| sink.lock().unwrap().push(s.status));

    actor.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = actor.get_snapshot();
    assert_eq!(snapshot.status, Status::Stopped);
    assert_eq!(snapshot.value, Query::Waiting);
    assert_eq!(*seen.lock().unwrap(), vec![Status::Active, Status::Stopped]);
    assert!(actor.send(Control::Again).is_err());
}

#[tokio::test]
async fn wait_for_gives_up() {
    let stopped = start(query(answer("slow"), PATIENCE, true));
    stopped.stop();

    let result = stopped
        .wait_for(is(Query::Answered), Duration::from_millis(20))
        .await;
    assert!(matches!(
        result,
        Err(ActorError::NotRunning {
            status: Status::Stopped,
            ..
        })
    ));

    let idle = Actor::new(
        query(answer("slow"), PATIENCE, true),
        (),
        ActorConfig::default(),
    );
    let result = idle
        .wait_for(is(Query::Answered), Duration::from_millis(20))
        .await;
    assert!(matches!(result, Err(ActorError::Timeout { .. })));
}
