//! Route definitions for the `/images` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Routes mounted at `/images`.
///
/// ```text
/// GET    /                 -> list_images
/// POST   /generate/async   -> generate_async
/// POST   /batch            -> generate_batch
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(images::list_images))
        .route("/generate/async", post(images::generate_async))
        .route("/batch", post(images::generate_batch))
}
