use axum::routing::post;
use axum::Router;

use crate::handlers::pipelines;
use crate::state::AppState;

/// Routes mounted at `/pipelines`.
///
/// ```text
/// POST   /                 -> submit_pipeline
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(pipelines::submit_pipeline))
}
