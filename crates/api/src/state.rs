use std::sync::Arc;
use std::time::Instant;

use mediagen_generation::{ArtifactStore, AudioBackend, ImageBackend};
use mediagen_jobs::JobManager;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Copy`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Job engine: submissions, polling and cancellation.
    pub jobs: Arc<JobManager>,
    pub image: Arc<dyn ImageBackend>,
    pub audio: Arc<dyn AudioBackend>,
    pub store: Arc<dyn ArtifactStore>,
    /// Process start, for the health endpoint's uptime.
    pub started_at: Instant,
}
