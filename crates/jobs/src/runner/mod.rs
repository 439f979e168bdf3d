//! Per-job-type execution routines and the shared executor.
//!
//! [`execute`] owns a job from `Queued` to its terminal state. The
//! type-specific routines only ever return an [`Outcome`] or a
//! [`JobError`]; translating those into registry transitions (and
//! logging them) happens here in one place.

mod audio;
mod batch;
mod image;
mod pipeline;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use mediagen_core::audio::AudioParams;
use mediagen_core::image::ImageGenerationRequest;
use mediagen_core::job::{JobResult, JobType, MSG_CANCELLED, MSG_PIPELINE_CANCELLED};
use mediagen_core::pipeline::PipelinePlan;
use mediagen_generation::{ArtifactStore, AudioBackend, BackendError, ImageBackend};
use tokio_util::sync::CancellationToken;

use crate::error::JobError;
use crate::registry::JobEntry;

pub(crate) use batch::BatchPlan;

/// Collaborators shared by every running job.
pub(crate) struct RunContext {
    pub image: Arc<dyn ImageBackend>,
    pub audio: Arc<dyn AudioBackend>,
    pub store: Arc<dyn ArtifactStore>,
    /// Pause between consecutive backend calls of one job.
    pub unit_delay: Duration,
}

/// Validated, typed payload of a submitted job.
pub(crate) enum Work {
    Image(ImageGenerationRequest),
    Batch(BatchPlan),
    Audio(AudioParams),
    Pipeline(PipelinePlan),
}

/// How a routine that ran to the end finished.
#[derive(Debug)]
pub(crate) enum Outcome {
    Completed {
        result: JobResult,
        message: String,
    },
    Failed {
        message: String,
        result: Option<JobResult>,
    },
}

/// Run `work` for `entry` until the job is terminal.
pub(crate) async fn execute(entry: Arc<JobEntry>, work: Work, ctx: Arc<RunContext>) {
    let job_id = entry.id().to_string();
    let job_type = entry.job_type();

    if !entry.start("Starting...") {
        tracing::debug!(job_id = %job_id, "Job no longer queued; skipping execution");
        return;
    }
    tracing::info!(job_id = %job_id, job_type = %job_type, "Job started");

    let cancel = entry.cancel_token().clone();
    let routine = async {
        match &work {
            Work::Image(req) => image::run(&entry, req, &ctx, &cancel).await,
            Work::Batch(plan) => batch::run(&entry, plan, &ctx, &cancel).await,
            Work::Audio(params) => audio::run(&entry, params, &ctx, &cancel).await,
            Work::Pipeline(plan) => pipeline::run(&entry, plan, &ctx, &cancel).await,
        }
    };

    match AssertUnwindSafe(routine).catch_unwind().await {
        Ok(Ok(Outcome::Completed { result, message })) => {
            if entry.complete(result, message.as_str()) {
                tracing::info!(job_id = %job_id, job_type = %job_type, %message, "Job completed");
            }
        }
        Ok(Ok(Outcome::Failed { message, result })) => {
            if entry.fail(message.as_str(), result) {
                tracing::warn!(job_id = %job_id, job_type = %job_type, error = %message, "Job failed");
            }
        }
        Ok(Err(JobError::Cancelled)) => {
            entry.mark_cancelled(cancelled_message(job_type));
            tracing::info!(job_id = %job_id, job_type = %job_type, "Job cancelled");
        }
        Ok(Err(e)) => {
            tracing::error!(job_id = %job_id, job_type = %job_type, error = %e, "Job aborted");
            entry.fail(e.to_string(), None);
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(job_id = %job_id, job_type = %job_type, error = %message, "Job panicked");
            entry.fail(message, None);
        }
    }
}

fn cancelled_message(job_type: JobType) -> &'static str {
    match job_type {
        JobType::Pipeline => MSG_PIPELINE_CANCELLED,
        _ => MSG_CANCELLED,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Internal error: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Internal error: {s}")
    } else {
        "Internal error".to_string()
    }
}

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// Bail out if the job has been cancelled.
pub(crate) fn checkpoint(cancel: &CancellationToken) -> Result<(), JobError> {
    if cancel.is_cancelled() {
        return Err(JobError::Cancelled);
    }
    Ok(())
}

/// Inter-unit delay that ends early on cancellation.
pub(crate) async fn pause(cancel: &CancellationToken, delay: Duration) -> Result<(), JobError> {
    checkpoint(cancel)?;
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(JobError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Split a backend error into cancellation and an ordinary failure.
pub(crate) fn backend_failure(err: BackendError) -> Result<String, JobError> {
    match err {
        BackendError::Cancelled => Err(JobError::Cancelled),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn pause_ends_early_on_cancel() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move { trigger.cancel() });

        let started = std::time::Instant::now();
        let res = pause(&cancel, Duration::from_secs(30)).await;
        assert_matches!(res, Err(JobError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn backend_cancellation_is_not_a_failure() {
        assert_matches!(
            backend_failure(BackendError::Cancelled),
            Err(JobError::Cancelled)
        );
        assert_matches!(
            backend_failure(BackendError::NoOutput),
            Ok(msg) if msg == "No images generated"
        );
    }

    #[test]
    fn panic_payloads_become_messages() {
        let boxed: Box<dyn Any + Send> = Box::new("index out of bounds");
        assert_eq!(
            panic_message(boxed.as_ref()),
            "Internal error: index out of bounds"
        );
    }
}
