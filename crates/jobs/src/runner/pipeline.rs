//! Pipeline jobs: ordered heterogeneous steps, each failure isolated to
//! its step.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use mediagen_core::audio::AudioArtifact;
use mediagen_core::job::{percent_complete, JobResult};
use mediagen_core::pipeline::{
    PipelinePlan, PipelineReport, PipelineStatus, StepCommand, StepReport, StepStatus,
};
use mediagen_generation::BackendError;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{checkpoint, panic_message, Outcome, RunContext};
use crate::error::JobError;
use crate::registry::JobEntry;

/// Why a single step did not produce a result.
enum StepError {
    Cancelled,
    Failed(String),
}

impl From<BackendError> for StepError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Cancelled => Self::Cancelled,
            other => Self::Failed(other.to_string()),
        }
    }
}

pub(super) async fn run(
    entry: &JobEntry,
    plan: &PipelinePlan,
    ctx: &RunContext,
    cancel: &CancellationToken,
) -> Result<Outcome, JobError> {
    let total = plan.steps.len();
    let mut reports = Vec::with_capacity(total);

    for step in &plan.steps {
        checkpoint(cancel)?;
        entry.set_progress(
            percent_complete(step.index, total),
            format!("Step {}/{}: {}", step.index + 1, total, step.action_name),
        );

        let attempt = AssertUnwindSafe(execute_step(&step.command, ctx, cancel))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(StepError::Failed(panic_message(panic.as_ref()))));

        match attempt {
            Ok(value) => {
                entry.record_success();
                reports.push(StepReport::completed(step, value));
            }
            Err(StepError::Cancelled) => return Err(JobError::Cancelled),
            Err(StepError::Failed(message)) => {
                tracing::warn!(
                    job_id = %entry.id(),
                    step = step.index,
                    action = %step.action_name,
                    error = %message,
                    "Pipeline step failed"
                );
                entry.record_failure();
                reports.push(StepReport::failed(step, message));
            }
        }
    }

    let failed = reports
        .iter()
        .filter(|r| r.status == StepStatus::Failed)
        .count();
    let status = PipelineStatus::from_steps(&reports);
    let message = match status {
        PipelineStatus::Completed => format!("Pipeline '{}' completed ({total} step(s))", plan.name),
        PipelineStatus::CompletedWithErrors => format!(
            "Pipeline '{}' completed with {failed} failed step(s) of {total}",
            plan.name
        ),
    };

    Ok(Outcome::Completed {
        message,
        result: JobResult::Pipeline(PipelineReport {
            pipeline_id: entry.id().to_string(),
            name: plan.name.clone(),
            status,
            steps: reports,
            created_at: entry.created_at(),
        }),
    })
}

async fn execute_step(
    command: &StepCommand,
    ctx: &RunContext,
    cancel: &CancellationToken,
) -> Result<Value, StepError> {
    match command {
        StepCommand::GenerateImage(request) => {
            let artifacts = ctx.image.generate(request, cancel).await?;
            if cancel.is_cancelled() {
                return Err(StepError::Cancelled);
            }
            for artifact in &artifacts {
                ctx.store
                    .save_image_metadata(artifact)
                    .await
                    .map_err(|e| StepError::Failed(e.to_string()))?;
            }
            to_value(&artifacts)
        }
        StepCommand::GenerateAudio(params) => {
            let audio = ctx.audio.generate_audio(params, cancel).await?;
            to_value(&AudioArtifact::from(&audio))
        }
        StepCommand::ListModels => to_value(&ctx.image.list_models().await?),
        StepCommand::ListSpeakers => to_value(&ctx.audio.list_speakers().await?),
        StepCommand::CheckStatus => {
            let (stable_diffusion, voicevox) = tokio::join!(
                ctx.image.check_connection(),
                ctx.audio.check_connection()
            );
            Ok(serde_json::json!({
                "stable_diffusion": stable_diffusion,
                "voicevox": voicevox,
            }))
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, StepError> {
    serde_json::to_value(value).map_err(|e| StepError::Failed(e.to_string()))
}
