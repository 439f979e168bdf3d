//! Service-level status and configuration.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

/// Reachability of each generation backend.
#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub stable_diffusion: bool,
    pub voicevox: bool,
}

/// GET /api/v1/status
///
/// Both probes run concurrently; an unreachable backend reports `false`
/// rather than failing the request.
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let (stable_diffusion, voicevox) = tokio::join!(
        state.image.check_connection(),
        state.audio.check_connection()
    );
    Json(DataResponse {
        data: BackendStatus {
            stable_diffusion,
            voicevox,
        },
    })
}

/// GET /api/v1/config
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: state.jobs.defaults().clone(),
    })
}
