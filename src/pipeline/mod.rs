//! The asset job pipeline: create an asset, upload it, email the client.
//!
//! Any stage can fail into the `error` state, which records the failure
//! message. `RETRY` then resumes at the first stage whose result is still
//! missing from the context, so work that already succeeded is never redone.
//!
//! [`job_pipeline`] is driven entirely by external events (the caller reports
//! `ASSET_CREATED`, `ASSET_UPLOADED`, `EMAIL_SENT` or `ERROR` itself).
//! [`job_pipeline_with_services`] additionally performs each stage on entry
//! through a [`JobServices`] environment and feeds the outcome back to the
//! machine.

mod events;
mod model;
mod services;

pub use events::JobEvent;
pub use model::{JobContext, JobState};
pub use services::JobServices;

use crate::builder::{transition, BuildError, MachineBuilder, StateBuilder, TransitionBuilder};
use crate::core::{Guard, InvocationError, Signal};
use crate::definition::MachineDefinition;
use crate::effects::Invocation;
use events::{created_asset, failure_message, uploaded_url};
use serde_json::json;

/// Machine id shared by both pipeline variants.
pub const MACHINE_ID: &str = "jobPipeline";

type Job<Env> = StateBuilder<JobState, JobContext, JobEvent, Env>;
type JobTransition = TransitionBuilder<JobState, JobContext, JobEvent>;

/// Event-driven pipeline definition.
pub fn job_pipeline() -> Result<MachineDefinition<JobState, JobContext, JobEvent>, BuildError> {
    assemble(creating_asset(), uploading_asset(), emailing_client())
}

/// Pipeline definition that runs each stage through `Env` on entry.
///
/// External events are still honoured, so a stage may also be completed by a
/// caller reporting its result before the service call returns; the late
/// service result is then discarded.
pub fn job_pipeline_with_services<Env>(
) -> Result<MachineDefinition<JobState, JobContext, JobEvent, Env>, BuildError>
where
    Env: JobServices + Clone + Send + Sync + 'static,
{
    let create = Invocation::from_async("createAsset", |_: JobContext, services: Env| async move {
        services
            .create_asset()
            .await
            .map(|asset_id| json!({ "assetId": asset_id }))
            .map_err(InvocationError::failed)
    });

    let upload = Invocation::from_async("uploadAsset", |job: JobContext, services: Env| async move {
        let Some(asset_id) = job.asset_id else {
            return Err(InvocationError::failed("no asset to upload"));
        };
        services
            .upload_asset(&asset_id)
            .await
            .map(|upload_url| json!({ "uploadUrl": upload_url }))
            .map_err(InvocationError::failed)
    });

    let email = Invocation::from_async("emailClient", |job: JobContext, services: Env| async move {
        let (Some(asset_id), Some(upload_url)) = (job.asset_id, job.upload_url) else {
            return Err(InvocationError::failed("nothing uploaded to email about"));
        };
        services
            .email_client(&asset_id, &upload_url)
            .await
            .map(|()| json!({}))
            .map_err(InvocationError::failed)
    });

    assemble(
        creating_asset()
            .invoke(create)
            .on_done(asset_created())
            .on_error(failed()),
        uploading_asset()
            .invoke(upload)
            .on_done(asset_uploaded())
            .on_error(failed()),
        emailing_client()
            .invoke(email)
            .on_done(email_sent())
            .on_error(failed()),
    )
}

fn assemble<Env>(
    creating: Job<Env>,
    uploading: Job<Env>,
    emailing: Job<Env>,
) -> Result<MachineDefinition<JobState, JobContext, JobEvent, Env>, BuildError> {
    MachineBuilder::new(MACHINE_ID)
        .initial(JobState::Idle)
        .context(JobContext::default())
        .state(JobState::Idle, idle())
        .state(JobState::CreatingAsset, creating)
        .state(JobState::UploadingAsset, uploading)
        .state(JobState::EmailingClient, emailing)
        .state(JobState::Error, error())
        .state(JobState::Done, StateBuilder::new())
        .build()
}

fn idle<Env>() -> Job<Env> {
    StateBuilder::new()
        .on("CREATE_ASSET", JobState::CreatingAsset)
        .on_with(
            "UPLOAD_ASSET",
            transition(JobState::UploadingAsset)
                .guard(Guard::context(|job: &JobContext| job.asset_id.is_some())),
        )
        .on_with(
            "EMAIL_CLIENT",
            transition(JobState::EmailingClient)
                .guard(Guard::context(|job: &JobContext| job.upload_url.is_some())),
        )
}

fn creating_asset<Env>() -> Job<Env> {
    StateBuilder::new()
        .on_with("ASSET_CREATED", asset_created())
        .on_with("ERROR", failed())
}

fn uploading_asset<Env>() -> Job<Env> {
    StateBuilder::new()
        .on_with("ASSET_UPLOADED", asset_uploaded())
        .on_with("ERROR", failed())
}

fn emailing_client<Env>() -> Job<Env> {
    StateBuilder::new()
        .on_with("EMAIL_SENT", email_sent())
        .on_with("ERROR", failed())
}

/// `RETRY` resumes at the first stage whose result is missing. With every
/// stage complete none of the guards pass and the event is ignored.
fn error<Env>() -> Job<Env> {
    let retry_at = |stage: JobState| {
        transition(stage.clone())
            .guard(Guard::context(move |job: &JobContext| {
                job.resume_point().as_ref() == Some(&stage)
            }))
            .assign(|job: &mut JobContext, _: &Signal<JobEvent>| job.error = None)
    };

    StateBuilder::new()
        .on_with("RETRY", retry_at(JobState::CreatingAsset))
        .on_with("RETRY", retry_at(JobState::UploadingAsset))
        .on_with("RETRY", retry_at(JobState::EmailingClient))
}

fn asset_created() -> JobTransition {
    transition(JobState::UploadingAsset).assign(|job: &mut JobContext, signal: &Signal<JobEvent>| {
        if let Some(asset_id) = created_asset(signal) {
            job.asset_id = Some(asset_id);
        }
    })
}

fn asset_uploaded() -> JobTransition {
    transition(JobState::EmailingClient).assign(
        |job: &mut JobContext, signal: &Signal<JobEvent>| {
            if let Some(upload_url) = uploaded_url(signal) {
                job.upload_url = Some(upload_url);
            }
        },
    )
}

fn email_sent() -> JobTransition {
    transition(JobState::Done)
        .assign(|job: &mut JobContext, _: &Signal<JobEvent>| job.email_sent = true)
}

fn failed() -> JobTransition {
    transition(JobState::Error).assign(|job: &mut JobContext, signal: &Signal<JobEvent>| {
        job.error = failure_message(signal);
    })
}
