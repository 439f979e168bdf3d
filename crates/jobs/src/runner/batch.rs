//! Multi-character batch jobs: every character times every repetition,
//! fail-soft.

use mediagen_core::defaults::GenerationDefaults;
use mediagen_core::image::{BatchImageRequest, ImageArtifact, ImageGenerationRequest};
use mediagen_core::job::{percent_complete, JobResult};
use tokio_util::sync::CancellationToken;

use super::{backend_failure, checkpoint, pause, Outcome, RunContext};
use crate::error::JobError;
use crate::registry::JobEntry;

/// One backend call of a batch.
#[derive(Debug, Clone)]
pub(crate) struct BatchUnit {
    pub character: String,
    /// 1-based repetition of this character.
    pub set: u32,
    pub request: ImageGenerationRequest,
}

/// A batch expanded into its units, in execution order.
#[derive(Debug, Clone)]
pub(crate) struct BatchPlan {
    pub batch_count: u32,
    pub units: Vec<BatchUnit>,
}

impl BatchPlan {
    pub fn from_request(req: &BatchImageRequest, defaults: &GenerationDefaults) -> Self {
        let units = req
            .characters
            .iter()
            .flat_map(|character| {
                let request = req.resolve_for(character, defaults);
                (1..=req.batch_count).map(move |set| BatchUnit {
                    character: character.name.clone(),
                    set,
                    request: request.clone(),
                })
            })
            .collect();

        Self {
            batch_count: req.batch_count,
            units,
        }
    }
}

pub(super) async fn run(
    entry: &JobEntry,
    plan: &BatchPlan,
    ctx: &RunContext,
    cancel: &CancellationToken,
) -> Result<Outcome, JobError> {
    let total = plan.units.len();
    let mut images = Vec::new();
    let mut errors = Vec::new();

    for (done, unit) in plan.units.iter().enumerate() {
        checkpoint(cancel)?;
        entry.set_progress(
            percent_complete(done, total),
            format!(
                "Generating {} ({}/{})... [{}/{}]",
                unit.character,
                unit.set,
                plan.batch_count,
                done + 1,
                total
            ),
        );

        match ctx.image.generate(&unit.request, cancel).await {
            Ok(artifacts) => {
                checkpoint(cancel)?;
                for artifact in &artifacts {
                    ctx.store.save_image_metadata(artifact).await?;
                }
                entry.record_success();
                images.extend(artifacts);
            }
            Err(e) => {
                let reason = backend_failure(e)?;
                let message = format!(
                    "{} (set {}/{}): {reason}",
                    unit.character, unit.set, plan.batch_count
                );
                tracing::warn!(job_id = %entry.id(), error = %message, "Batch unit failed");
                entry.record_failure();
                errors.push(message);
            }
        }

        if done + 1 < total {
            pause(cancel, ctx.unit_delay).await?;
        }
    }

    Ok(summarize(images, errors, total))
}

/// Apply the batch outcome rule: no failures is a plain list, some
/// failures a composite result, all failures a failed job.
fn summarize(images: Vec<ImageArtifact>, errors: Vec<String>, total: usize) -> Outcome {
    let failed = errors.len();
    if failed == 0 {
        Outcome::Completed {
            message: format!("Generated {} image(s)", images.len()),
            result: JobResult::Images(images),
        }
    } else if failed < total {
        Outcome::Completed {
            message: format!(
                "Generated {} image(s), {failed} of {total} generation(s) failed",
                images.len()
            ),
            result: JobResult::PartialImages { images, errors },
        }
    } else {
        Outcome::Failed {
            message: format!("All {total} generation(s) failed"),
            result: Some(JobResult::Errors { errors }),
        }
    }
}
