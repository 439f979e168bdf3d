//! Handlers for the `/models` catalog.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use mediagen_core::image::{RESOLUTIONS, SAMPLERS};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/models
pub async fn list_models(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let models = state.image.list_models().await?;
    Ok(Json(DataResponse { data: models }))
}

/// GET /api/v1/models/loras
pub async fn list_loras(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let loras = state.image.list_loras().await?;
    Ok(Json(DataResponse { data: loras }))
}

/// GET /api/v1/models/samplers
pub async fn list_samplers() -> Json<DataResponse<&'static [&'static str]>> {
    Json(DataResponse { data: SAMPLERS })
}

/// GET /api/v1/models/resolutions
pub async fn list_resolutions() -> impl IntoResponse {
    Json(DataResponse { data: RESOLUTIONS })
}
