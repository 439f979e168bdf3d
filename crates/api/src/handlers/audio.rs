//! Handlers for the `/audio` resource.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use mediagen_core::audio::AudioGenerateRequest;

use crate::error::AppResult;
use crate::handlers::jobs::accepted;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/audio/generate/async
pub async fn generate_async(
    State(state): State<AppState>,
    Json(input): Json<AudioGenerateRequest>,
) -> AppResult<impl IntoResponse> {
    let job_id = state.jobs.submit_audio(&input)?;
    accepted(&state, &job_id)
}

/// GET /api/v1/audio/speakers
///
/// One entry per speaker/style pair reported by the speech engine.
pub async fn list_speakers(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let speakers = state.audio.list_speakers().await?;
    Ok(Json(DataResponse { data: speakers }))
}
