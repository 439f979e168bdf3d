use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use mediagen_core::pipeline::PipelineRequest;

use crate::error::AppResult;
use crate::handlers::jobs::accepted;
use crate::state::AppState;

/// POST /api/v1/pipelines
///
/// Queue a pipeline job. The name must be non-blank, `steps` non-empty,
/// and every step action known; otherwise 400 and no job is created.
pub async fn submit_pipeline(
    State(state): State<AppState>,
    Json(input): Json<PipelineRequest>,
) -> AppResult<impl IntoResponse> {
    let job_id = state.jobs.submit_pipeline(input)?;
    accepted(&state, &job_id)
}
