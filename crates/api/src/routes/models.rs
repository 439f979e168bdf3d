//! Route definitions for the `/models` catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::models;
use crate::state::AppState;

/// Routes mounted at `/models`.
///
/// ```text
/// GET    /                 -> list_models
/// GET    /loras            -> list_loras
/// GET    /samplers         -> list_samplers
/// GET    /resolutions      -> list_resolutions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(models::list_models))
        .route("/loras", get(models::list_loras))
        .route("/samplers", get(models::list_samplers))
        .route("/resolutions", get(models::list_resolutions))
}
