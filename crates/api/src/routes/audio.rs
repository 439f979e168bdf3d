//! Route definitions for the `/audio` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::audio;
use crate::state::AppState;

/// Routes mounted at `/audio`.
///
/// ```text
/// POST   /generate/async   -> generate_async
/// GET    /speakers         -> list_speakers
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate/async", post(audio::generate_async))
        .route("/speakers", get(audio::list_speakers))
}
