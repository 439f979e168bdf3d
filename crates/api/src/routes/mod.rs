pub mod audio;
pub mod health;
pub mod images;
pub mod jobs;
pub mod models;
pub mod pipelines;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /status                      backend connectivity
/// /config                      generation defaults
///
/// /models                      checkpoints known to the image backend
/// /models/loras                LoRA names
/// /models/samplers             sampler names
/// /models/resolutions          recommended output sizes
///
/// /images                      stored image metadata
/// /images/generate/async       single-image job (POST)
/// /images/batch                multi-character batch job (POST)
///
/// /audio/generate/async        speech synthesis job (POST)
/// /audio/speakers              available voices
///
/// /pipelines                   pipeline job (POST)
///
/// /jobs                        list
/// /jobs/{id}                   get
/// /jobs/{id}/cancel            cancel (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::system::get_status))
        .route("/config", get(handlers::system::get_config))
        .nest("/models", models::router())
        .nest("/images", images::router())
        .nest("/audio", audio::router())
        .nest("/pipelines", pipelines::router())
        .nest("/jobs", jobs::router())
}
