//! Handlers for the `/jobs` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mediagen_core::error::CoreError;
use mediagen_core::job::{JobResult, JobStatus, JobType};
use mediagen_core::types::Timestamp;
use mediagen_jobs::JobSnapshot;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// External view of a job record.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub progress: f64,
    pub message: String,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub result: Option<JobResult>,
    pub success_count: u32,
    pub failed_count: u32,
}

impl From<JobSnapshot> for JobResponse {
    fn from(snap: JobSnapshot) -> Self {
        Self {
            job_id: snap.id,
            job_type: snap.job_type,
            status: snap.status,
            progress: snap.progress,
            message: snap.message,
            created_at: snap.created_at,
            completed_at: snap.completed_at,
            result: snap.result,
            success_count: snap.success_count,
            failed_count: snap.failed_count,
        }
    }
}

fn job_not_found(id: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Job",
        id: id.to_string(),
    })
}

/// Answer a fresh submission with `202 Accepted` and the job as it stands.
pub(crate) fn accepted(state: &AppState, job_id: &str) -> AppResult<impl IntoResponse> {
    let snap = state.jobs.get(job_id).ok_or_else(|| {
        AppError::InternalError(format!("Submitted job {job_id} missing from registry"))
    })?;
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: JobResponse::from(snap),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
///
/// Every job still held by the registry, newest first.
pub async fn list_jobs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let jobs: Vec<JobResponse> = state
        .jobs
        .list_all()
        .into_iter()
        .map(JobResponse::from)
        .collect();
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snap = state.jobs.get(&job_id).ok_or_else(|| job_not_found(&job_id))?;
    Ok(Json(DataResponse {
        data: JobResponse::from(snap),
    }))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{id}/cancel
///
/// Cancel a queued or running job. Returns 404 for unknown ids and 409
/// when the job has already finished.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snap = state.jobs.cancel(&job_id)?;
    Ok(Json(DataResponse {
        data: JobResponse::from(snap),
    }))
}
