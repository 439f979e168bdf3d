//! Handlers for the `/images` resource.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use mediagen_core::image::{BatchImageRequest, ImageGenerateRequest};

use crate::error::AppResult;
use crate::handlers::jobs::accepted;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/images
///
/// Stored image metadata, newest first.
pub async fn list_images(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let images = state.store.list_images().await?;
    Ok(Json(DataResponse { data: images }))
}

/// POST /api/v1/images/generate/async
///
/// Queue a single-image job. Sets run fail-fast.
pub async fn generate_async(
    State(state): State<AppState>,
    Json(input): Json<ImageGenerateRequest>,
) -> AppResult<impl IntoResponse> {
    let job_id = state.jobs.submit_image(&input)?;
    accepted(&state, &job_id)
}

/// POST /api/v1/images/batch
///
/// Queue a multi-character batch job. Unit failures are collected rather
/// than aborting the batch.
pub async fn generate_batch(
    State(state): State<AppState>,
    Json(input): Json<BatchImageRequest>,
) -> AppResult<impl IntoResponse> {
    let job_id = state.jobs.submit_batch(&input)?;
    tracing::info!(
        job_id = %job_id,
        characters = input.characters.len(),
        batch_count = input.batch_count,
        "Batch submitted",
    );
    accepted(&state, &job_id)
}
