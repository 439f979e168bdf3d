//! Public face of the job engine.

use std::sync::Arc;
use std::time::Duration;

use mediagen_core::audio::AudioGenerateRequest;
use mediagen_core::defaults::GenerationDefaults;
use mediagen_core::error::CoreError;
use mediagen_core::image::{BatchImageRequest, ImageGenerateRequest};
use mediagen_core::job::{JobStatus, JobType, MSG_CANCELLED_BY_USER};
use mediagen_core::pipeline::PipelineRequest;
use mediagen_core::validation::{
    validate_audio_request, validate_batch_request, validate_image_request,
};
use mediagen_generation::{ArtifactStore, AudioBackend, ImageBackend};

use crate::registry::{JobRegistry, JobSnapshot};
use crate::runner::{self, BatchPlan, RunContext, Work};

/// Default pause between consecutive backend calls of one job.
pub const DEFAULT_UNIT_DELAY: Duration = Duration::from_millis(500);

/// Tunables for [`JobManager`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub defaults: GenerationDefaults,
    pub unit_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            defaults: GenerationDefaults::default(),
            unit_delay: DEFAULT_UNIT_DELAY,
        }
    }
}

/// Accepts submissions, spawns one routine per job, and answers
/// status and cancel requests.
///
/// Every `submit_*` call validates its input first; a rejected request
/// never creates a job. On success the job id is returned immediately
/// while the routine runs on its own tokio task.
pub struct JobManager {
    registry: Arc<JobRegistry>,
    ctx: Arc<RunContext>,
    defaults: GenerationDefaults,
}

impl JobManager {
    pub fn new(
        image: Arc<dyn ImageBackend>,
        audio: Arc<dyn AudioBackend>,
        store: Arc<dyn ArtifactStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            ctx: Arc::new(RunContext {
                image,
                audio,
                store,
                unit_delay: settings.unit_delay,
            }),
            defaults: settings.defaults,
        }
    }

    /// Shared handle to the registry, for the expiry sweeper.
    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn defaults(&self) -> &GenerationDefaults {
        &self.defaults
    }

    // ---- submission ----

    pub fn submit_image(&self, req: &ImageGenerateRequest) -> Result<String, CoreError> {
        let resolved = req.resolve(&self.defaults);
        validate_image_request(&resolved)?;
        Ok(self.spawn(JobType::SingleImage, Work::Image(resolved)))
    }

    pub fn submit_batch(&self, req: &BatchImageRequest) -> Result<String, CoreError> {
        validate_batch_request(req)?;
        let plan = BatchPlan::from_request(req, &self.defaults);
        Ok(self.spawn(JobType::BatchImage, Work::Batch(plan)))
    }

    pub fn submit_audio(&self, req: &AudioGenerateRequest) -> Result<String, CoreError> {
        let params = req.resolve(&self.defaults);
        validate_audio_request(&params)?;
        Ok(self.spawn(JobType::Audio, Work::Audio(params)))
    }

    pub fn submit_pipeline(&self, req: PipelineRequest) -> Result<String, CoreError> {
        let plan = req.into_plan(&self.defaults)?;
        Ok(self.spawn(JobType::Pipeline, Work::Pipeline(plan)))
    }

    fn spawn(&self, job_type: JobType, work: Work) -> String {
        let entry = self.registry.create(job_type);
        let id = entry.id().to_string();
        tracing::info!(job_id = %id, job_type = %job_type, "Job queued");
        tokio::spawn(runner::execute(entry, work, Arc::clone(&self.ctx)));
        id
    }

    // ---- queries ----

    pub fn get(&self, id: &str) -> Option<JobSnapshot> {
        self.registry.snapshot(id)
    }

    /// All jobs, newest first.
    pub fn list_all(&self) -> Vec<JobSnapshot> {
        self.registry.list_all()
    }

    /// Cancel a queued or running job.
    ///
    /// Fails with `NotFound` for unknown ids and `Conflict` when the job
    /// has already reached a terminal state.
    pub fn cancel(&self, id: &str) -> Result<JobSnapshot, CoreError> {
        let entry = self.registry.get(id).ok_or_else(|| CoreError::NotFound {
            entity: "Job",
            id: id.to_string(),
        })?;

        if !entry.mark_cancelled(MSG_CANCELLED_BY_USER) {
            let status: JobStatus = entry.status();
            return Err(CoreError::Conflict(format!(
                "Job {id} cannot be cancelled in status '{status}'"
            )));
        }
        tracing::info!(job_id = %id, "Job cancelled by user");
        Ok(entry.snapshot())
    }
}
