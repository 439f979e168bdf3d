//! Exercises the HTTP clients against in-process fake engines.

use std::net::SocketAddr;

use assert_matches::assert_matches;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::prelude::*;
use mediagen_core::audio::AudioParams;
use mediagen_core::defaults::GenerationDefaults;
use mediagen_core::image::ImageGenerateRequest;
use mediagen_generation::{
    AudioBackend, BackendError, ImageBackend, StableDiffusionClient, VoicevoxClient,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn fake_stable_diffusion(images: Vec<String>) -> Router {
    Router::new()
        .route(
            "/sdapi/v1/sd-models",
            get(|| async { Json(json!([{ "title": "b.safetensors" }, { "title": "a.ckpt" }])) }),
        )
        .route(
            "/sdapi/v1/loras",
            get(|| async { Json(json!([{ "name": "watercolor" }])) }),
        )
        .route(
            "/sdapi/v1/txt2img",
            post(move |Json(_body): Json<Value>| {
                let images = images.clone();
                async move { Json(json!({ "images": images })) }
            }),
        )
}

fn image_request(batch_count: u32) -> mediagen_core::image::ImageGenerationRequest {
    let req: ImageGenerateRequest = serde_json::from_value(json!({
        "prompt": "castle",
        "char_name": "hero",
        "batch_count": batch_count,
    }))
    .unwrap();
    req.resolve(&GenerationDefaults::default())
}

// ---------------------------------------------------------------------------
// Stable Diffusion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sd_generate_writes_decoded_png() {
    let png = BASE64_STANDARD.encode(b"\x89PNG fake");
    let url = serve(fake_stable_diffusion(vec![png])).await;
    let dir = tempfile::tempdir().unwrap();
    let client = StableDiffusionClient::new(url, dir.path());

    let artifacts = client
        .generate(&image_request(1), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].file_name.starts_with("hero_"));
    assert_eq!(artifacts[0].batch_index, 1);
    let written = std::fs::read(&artifacts[0].file_path).unwrap();
    assert_eq!(written, b"\x89PNG fake");
}

#[tokio::test]
async fn sd_empty_image_list_is_no_output() {
    let url = serve(fake_stable_diffusion(vec![])).await;
    let dir = tempfile::tempdir().unwrap();
    let client = StableDiffusionClient::new(url, dir.path());

    let err = client
        .generate(&image_request(1), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(err, BackendError::NoOutput);
    assert_eq!(err.to_string(), "No images generated");
}

#[tokio::test]
async fn sd_cancelled_token_skips_request() {
    let url = serve(fake_stable_diffusion(vec![BASE64_STANDARD.encode(b"x")])).await;
    let dir = tempfile::tempdir().unwrap();
    let client = StableDiffusionClient::new(url, dir.path());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.generate(&image_request(1), &cancel).await.unwrap_err();
    assert_matches!(err, BackendError::Cancelled);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn sd_listings_are_sorted() {
    let url = serve(fake_stable_diffusion(vec![])).await;
    let client = StableDiffusionClient::new(url, "/tmp");

    assert!(client.check_connection().await);
    assert_eq!(
        client.list_models().await.unwrap(),
        vec!["a.ckpt".to_string(), "b.safetensors".to_string()]
    );
    assert_eq!(client.list_loras().await.unwrap(), vec!["watercolor".to_string()]);
}

#[tokio::test]
async fn sd_server_error_carries_status_and_body() {
    let router = Router::new().route(
        "/sdapi/v1/txt2img",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "CUDA out of memory") }),
    );
    let url = serve(router).await;
    let dir = tempfile::tempdir().unwrap();
    let client = StableDiffusionClient::new(url, dir.path());

    let err = client
        .generate(&image_request(1), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(err, BackendError::Api { status: 500, ref body } if body.contains("CUDA"));
}

#[tokio::test]
async fn sd_unreachable_reports_disconnected() {
    let client = StableDiffusionClient::new("http://127.0.0.1:1", "/tmp");
    assert!(!client.check_connection().await);
}

// ---------------------------------------------------------------------------
// VOICEVOX
// ---------------------------------------------------------------------------

fn fake_voicevox() -> Router {
    Router::new()
        .route("/version", get(|| async { Json("0.14.0") }))
        .route(
            "/speakers",
            get(|| async {
                Json(json!([{ "name": "Zundamon", "styles": [{ "id": 3, "name": "Normal" }] }]))
            }),
        )
        .route(
            "/audio_query",
            post(|Query(q): Query<Vec<(String, String)>>| async move {
                Json(json!({ "speedScale": 1.0, "query": q }))
            }),
        )
        .route(
            "/synthesis",
            post(|Json(body): Json<Value>| async move {
                // Echo the patched speed back as the "audio" payload.
                format!("RIFF{}", body["speedScale"]).into_bytes()
            }),
        )
}

fn audio_params(save_file: bool) -> AudioParams {
    AudioParams {
        text: "hello world".into(),
        speaker_id: 3,
        speed: 1.5,
        pitch: 0.0,
        intonation: 1.0,
        volume: 1.0,
        save_file,
        file_name: Some("greeting".into()),
    }
}

#[tokio::test]
async fn voicevox_synthesis_applies_prosody_and_saves() {
    let url = serve(fake_voicevox()).await;
    let dir = tempfile::tempdir().unwrap();
    let client = VoicevoxClient::new(url, dir.path());

    let audio = client
        .generate_audio(&audio_params(true), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(audio.bytes, b"RIFF1.5");
    let path = audio.file_path.expect("file should be saved");
    assert!(path.ends_with("greeting.wav"));
    assert_eq!(std::fs::read(path).unwrap(), b"RIFF1.5");
}

#[tokio::test]
async fn voicevox_without_save_returns_bytes_only() {
    let url = serve(fake_voicevox()).await;
    let dir = tempfile::tempdir().unwrap();
    let client = VoicevoxClient::new(url, dir.path());

    let audio = client
        .generate_audio(&audio_params(false), &CancellationToken::new())
        .await
        .unwrap();
    assert!(audio.file_path.is_none());
    assert!(!audio.bytes.is_empty());
}

#[tokio::test]
async fn voicevox_speakers_and_probe() {
    let url = serve(fake_voicevox()).await;
    let client = VoicevoxClient::new(url, "/tmp");

    assert!(client.check_connection().await);
    let speakers = client.list_speakers().await.unwrap();
    assert_eq!(speakers.len(), 1);
    assert_eq!(speakers[0].name, "Zundamon (Normal)");
}
