//! Audio jobs: one synthesis call.

use mediagen_core::audio::{AudioArtifact, AudioParams};
use mediagen_core::job::JobResult;
use tokio_util::sync::CancellationToken;

use super::{backend_failure, checkpoint, Outcome, RunContext};
use crate::error::JobError;
use crate::registry::JobEntry;

pub(super) async fn run(
    entry: &JobEntry,
    params: &AudioParams,
    ctx: &RunContext,
    cancel: &CancellationToken,
) -> Result<Outcome, JobError> {
    checkpoint(cancel)?;
    entry.set_progress(0.0, "Synthesizing audio...");

    match ctx.audio.generate_audio(params, cancel).await {
        Ok(audio) => {
            entry.record_success();
            Ok(Outcome::Completed {
                message: "Audio generated".to_string(),
                result: JobResult::Audio(AudioArtifact::from(&audio)),
            })
        }
        Err(e) => {
            let message = backend_failure(e)?;
            tracing::warn!(job_id = %entry.id(), error = %message, "Audio generation failed");
            entry.record_failure();
            Ok(Outcome::Failed {
                message,
                result: None,
            })
        }
    }
}
