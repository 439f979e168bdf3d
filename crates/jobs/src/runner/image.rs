//! Single-image jobs: `batch_count` sequential sets, fail-fast.

use mediagen_core::image::ImageGenerationRequest;
use mediagen_core::job::{percent_complete, JobResult};
use tokio_util::sync::CancellationToken;

use super::{backend_failure, checkpoint, pause, Outcome, RunContext};
use crate::error::JobError;
use crate::registry::JobEntry;

pub(super) async fn run(
    entry: &JobEntry,
    request: &ImageGenerationRequest,
    ctx: &RunContext,
    cancel: &CancellationToken,
) -> Result<Outcome, JobError> {
    let sets = request.batch_count.max(1);
    let mut images = Vec::new();

    for set in 1..=sets {
        checkpoint(cancel)?;
        entry.set_progress(
            percent_complete((set - 1) as usize, sets as usize),
            format!("Generating set {set}/{sets}..."),
        );

        let artifacts = match ctx.image.generate(request, cancel).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                let message = backend_failure(e)?;
                tracing::warn!(job_id = %entry.id(), set, error = %message, "Image generation failed");
                entry.record_failure();
                return Ok(Outcome::Failed {
                    message,
                    result: None,
                });
            }
        };

        checkpoint(cancel)?;
        for artifact in &artifacts {
            ctx.store.save_image_metadata(artifact).await?;
        }
        entry.record_success();
        images.extend(artifacts);

        if set < sets {
            pause(cancel, ctx.unit_delay).await?;
        }
    }

    Ok(Outcome::Completed {
        message: format!("Generated {} image(s)", images.len()),
        result: JobResult::Images(images),
    })
}
