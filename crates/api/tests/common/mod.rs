#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use mediagen_core::audio::{AudioParams, GeneratedAudio, Speaker};
use mediagen_core::defaults::GenerationDefaults;
use mediagen_core::image::{ImageArtifact, ImageGenerationRequest};
use mediagen_generation::{AudioBackend, BackendError, ImageBackend, MemoryArtifactStore};
use mediagen_jobs::{EngineSettings, JobManager};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use mediagen_api::config::ServerConfig;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// No database URL; the app runs on the in-memory artifact store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        sd_api_url: "http://127.0.0.1:1".to_string(),
        sd_output_dir: "./data/images".to_string(),
        voicevox_api_url: "http://127.0.0.1:1".to_string(),
        voicevox_output_dir: "./data/audio".to_string(),
        defaults: GenerationDefaults::default(),
        job_unit_delay_ms: 0,
        job_retention_minutes: 60,
        job_sweep_interval_secs: 300,
    }
}

// ---------------------------------------------------------------------------
// Fake backends
// ---------------------------------------------------------------------------

/// Image backend that either succeeds at once or blocks until cancelled.
pub struct FakeImageBackend {
    pub hang: bool,
}

#[async_trait]
impl ImageBackend for FakeImageBackend {
    async fn check_connection(&self) -> bool {
        true
    }

    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        Ok(vec![
            "anything-v5.safetensors".to_string(),
            "dreamshaper_8.safetensors".to_string(),
        ])
    }

    async fn list_loras(&self) -> Result<Vec<String>, BackendError> {
        Ok(vec!["watercolor".to_string()])
    }

    async fn generate(
        &self,
        request: &ImageGenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImageArtifact>, BackendError> {
        if self.hang {
            cancel.cancelled().await;
            return Err(BackendError::Cancelled);
        }
        let file_name = format!("{}_0.png", request.char_name);
        Ok(vec![ImageArtifact::from_request(
            request,
            file_name.clone(),
            format!("/out/{file_name}"),
            1,
        )])
    }
}

/// Audio backend whose engine is unreachable for status probes and
/// speaker listing, but which still synthesizes.
pub struct FakeAudioBackend;

#[async_trait]
impl AudioBackend for FakeAudioBackend {
    async fn check_connection(&self) -> bool {
        false
    }

    async fn list_speakers(&self) -> Result<Vec<Speaker>, BackendError> {
        Err(BackendError::Api {
            status: 503,
            body: "engine offline".to_string(),
        })
    }

    async fn generate_audio(
        &self,
        _params: &AudioParams,
        _cancel: &CancellationToken,
    ) -> Result<GeneratedAudio, BackendError> {
        Ok(GeneratedAudio {
            bytes: vec![0u8; 64],
            file_path: None,
        })
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Build the full application router with all middleware layers, using
/// fake backends and the in-memory store.
pub fn build_test_app() -> Router {
    build_test_app_with(false)
}

/// Like [`build_test_app`], but image generation blocks until cancelled.
pub fn build_test_app_with(hang_images: bool) -> Router {
    let config = test_config();
    let image = Arc::new(FakeImageBackend { hang: hang_images });
    let audio = Arc::new(FakeAudioBackend);
    let store = Arc::new(MemoryArtifactStore::new());

    let jobs = Arc::new(JobManager::new(
        image.clone(),
        audio.clone(),
        store.clone(),
        EngineSettings {
            defaults: config.defaults.clone(),
            unit_delay: Duration::ZERO,
        },
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        jobs,
        image,
        audio,
        store,
        started_at: Instant::now(),
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `GET /api/v1/jobs/{id}` until the job leaves queued/running.
pub async fn wait_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    let uri = format!("/api/v1/jobs/{job_id}");
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let json = body_json(get(app.clone(), &uri).await).await;
            let status = json["data"]["status"].as_str().unwrap_or_default().to_string();
            if !matches!(status.as_str(), "queued" | "running") {
                return json["data"].clone();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job should reach a terminal state")
}
