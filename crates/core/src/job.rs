//! Job lifecycle enums and result payloads.

use serde::{Deserialize, Serialize};

use crate::audio::AudioArtifact;
use crate::image::ImageArtifact;
use crate::pipeline::PipelineReport;

/// Message stamped on a job cancelled through the public cancel call.
pub const MSG_CANCELLED_BY_USER: &str = "Cancelled by user";

/// Message stamped when a routine observes cancellation itself.
pub const MSG_CANCELLED: &str = "Cancelled";

/// Pipeline flavour of [`MSG_CANCELLED`].
pub const MSG_PIPELINE_CANCELLED: &str = "Pipeline cancelled";

/// Kind of operation a job performs. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    SingleImage,
    BatchImage,
    Audio,
    Pipeline,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleImage => "single_image",
            Self::BatchImage => "batch_image",
            Self::Audio => "audio",
            Self::Pipeline => "pipeline",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Completed, Failed, and Cancelled admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Only queued and running jobs may be cancelled.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal payload of a job. The variant depends on the job type and,
/// for batch jobs, on how many units failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobResult {
    /// Every unit succeeded (single-image and batch jobs).
    Images(Vec<ImageArtifact>),
    /// Batch job where some, but not all, units failed.
    PartialImages {
        images: Vec<ImageArtifact>,
        errors: Vec<String>,
    },
    /// Batch job where every unit failed.
    Errors { errors: Vec<String> },
    Audio(AudioArtifact),
    Pipeline(PipelineReport),
}

/// Percentage of `done` out of `total`, in `0.0..=100.0`.
///
/// A job with no units is reported as fully done.
pub fn percent_complete(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn cancellable_statuses_are_the_non_terminal_ones() {
        for status in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(status.is_cancellable(), !status.is_terminal());
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(JobStatus::Cancelled).unwrap(),
            serde_json::json!("cancelled")
        );
        assert_eq!(
            serde_json::to_value(JobType::BatchImage).unwrap(),
            serde_json::json!("batch_image")
        );
    }

    #[test]
    fn percent_complete_bounds() {
        assert_eq!(percent_complete(0, 4), 0.0);
        assert_eq!(percent_complete(1, 4), 25.0);
        assert_eq!(percent_complete(4, 4), 100.0);
        assert_eq!(percent_complete(0, 0), 100.0);
    }

    #[test]
    fn partial_result_shape() {
        let result = JobResult::PartialImages {
            images: vec![],
            errors: vec!["boom".into()],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["images"].is_array());
        assert_eq!(json["errors"][0], "boom");
    }
}
