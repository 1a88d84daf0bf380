//! Job Pipeline
//!
//! This example runs the create → upload → email job against simulated
//! services whose upload fails once.
//!
//! Key concepts:
//! - Invocations run each stage on state entry
//! - A failed stage lands in `error` with its message in the context
//! - The job is checkpointed, "crashes", and is resumed from JSON
//! - RETRY resumes at the failed stage instead of starting over
//!
//! Run with: cargo run --example job_pipeline

use async_trait::async_trait;
use statecraft::actor::{Actor, ActorConfig, Status};
use statecraft::checkpoint::Checkpoint;
use statecraft::core::State;
use statecraft::pipeline::{
    job_pipeline_with_services, JobContext, JobEvent, JobServices, JobState,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct SimulatedStudio {
    upload_failed_once: AtomicBool,
}

const LATENCY: Duration = Duration::from_millis(100);

#[async_trait]
impl JobServices for SimulatedStudio {
    async fn create_asset(&self) -> Result<String, String> {
        println!("  [studio] creating asset");
        tokio::time::sleep(LATENCY).await;
        Ok("asset-7".to_string())
    }

    async fn upload_asset(&self, asset_id: &str) -> Result<String, String> {
        tokio::time::sleep(LATENCY).await;
        if !self.upload_failed_once.swap(true, Ordering::SeqCst) {
            println!("  [studio] upload of {} failed", asset_id);
            return Err("storage bucket unavailable".to_string());
        }
        println!("  [studio] uploaded {}", asset_id);
        Ok(format!("https://cdn.example/{}", asset_id))
    }

    async fn email_client(&self, asset_id: &str, upload_url: &str) -> Result<(), String> {
        tokio::time::sleep(LATENCY).await;
        println!("  [studio] emailed client about {} at {}", asset_id, upload_url);
        Ok(())
    }
}

fn describe(label: &str, context: &JobContext) {
    println!(
        "  {:<16} assetId={:?} uploadUrl={:?} emailSent={} error={:?}",
        label, context.asset_id, context.upload_url, context.email_sent, context.error
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Job Pipeline Example ===\n");

    let studio = Arc::new(SimulatedStudio {
        upload_failed_once: AtomicBool::new(false),
    });
    let definition = Arc::new(job_pipeline_with_services::<Arc<SimulatedStudio>>()?);

    // Run 1: fails during upload
    println!("Run 1: starting job");
    println!("----------------------------------------");
    let job = Actor::new(
        Arc::clone(&definition),
        Arc::clone(&studio),
        ActorConfig::default().with_id("job-1"),
    );
    let subscription = job.subscribe(|snapshot| {
        describe(snapshot.value.name(), &snapshot.context);
    });
    job.start()?;
    job.send(JobEvent::CreateAsset)?;

    let failed = job
        .wait_for(|s| s.value == JobState::Error, Duration::from_secs(5))
        .await?;
    println!("\n  Job failed: {:?}", failed.context.error);

    let saved = job.checkpoint().to_json()?;
    subscription.unsubscribe();
    job.stop();
    println!("  [checkpoint] {} bytes saved, process exits\n", saved.len());

    // Run 2: resume and retry
    println!("Run 2: resuming from checkpoint");
    println!("----------------------------------------");
    let checkpoint: Checkpoint<JobState, JobContext> = Checkpoint::from_json(&saved)?;
    let job = Actor::resume(
        definition,
        studio,
        ActorConfig::default().with_id("job-1"),
        checkpoint,
    )?;
    let _subscription = job.subscribe(|snapshot| {
        describe(snapshot.value.name(), &snapshot.context);
    });
    job.start()?;
    job.send(JobEvent::Retry)?;

    let done = job
        .wait_for(|s| s.status == Status::Done, Duration::from_secs(5))
        .await?;

    println!("\nJob completed with status {}", done.status);
    let history = job.history();
    let path: Vec<_> = history.get_path().into_iter().map(|s| s.name()).collect();
    println!("Path: {}", path.join(" -> "));

    Ok(())
}
