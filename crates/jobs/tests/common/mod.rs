//! Scripted fake backends and helpers shared by the job engine tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mediagen_core::audio::{AudioParams, GeneratedAudio, Speaker};
use mediagen_core::defaults::GenerationDefaults;
use mediagen_core::image::{ImageArtifact, ImageGenerationRequest};
use mediagen_generation::{
    ArtifactStore, AudioBackend, BackendError, ImageBackend, MemoryArtifactStore, StoreError,
};
use mediagen_jobs::{EngineSettings, JobManager, JobSnapshot};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Scripted behaviour
// ---------------------------------------------------------------------------

/// What the next backend call does. Calls past the end of the script
/// succeed.
#[derive(Debug, Clone)]
pub enum Step {
    Ok,
    /// Return `BackendError::Api { status: 500, body }`.
    Fail(&'static str),
    /// Block until the call is cancelled.
    Hang,
    Panic,
    /// Succeed after sleeping.
    Slow(Duration),
}

#[derive(Default)]
struct Script {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl Script {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Record a call and return `(1-based call number, step)`.
    fn next(&self) -> (usize, Step) {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Ok);
        (n, step)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn play<T>(
    step: Step,
    cancel: &CancellationToken,
    ok: impl FnOnce() -> T,
) -> Result<T, BackendError> {
    match step {
        Step::Ok => Ok(ok()),
        Step::Fail(body) => Err(BackendError::Api {
            status: 500,
            body: body.to_string(),
        }),
        Step::Hang => {
            cancel.cancelled().await;
            Err(BackendError::Cancelled)
        }
        Step::Panic => panic!("backend exploded"),
        Step::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Ok(ok())
        }
    }
}

// ---------------------------------------------------------------------------
// Fake image backend
// ---------------------------------------------------------------------------

pub struct FakeImageBackend {
    script: Script,
    pub connected: bool,
}

impl FakeImageBackend {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(steps),
            connected: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl ImageBackend for FakeImageBackend {
    async fn check_connection(&self) -> bool {
        self.connected
    }

    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        Ok(vec!["dreamshaper_8.safetensors".to_string()])
    }

    async fn list_loras(&self) -> Result<Vec<String>, BackendError> {
        Ok(vec![])
    }

    async fn generate(
        &self,
        request: &ImageGenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImageArtifact>, BackendError> {
        let (n, step) = self.script.next();
        play(step, cancel, || {
            let file_name = format!("{}_{n}.png", request.char_name);
            vec![ImageArtifact::from_request(
                request,
                file_name.clone(),
                format!("/out/{file_name}"),
                1,
            )]
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Fake audio backend
// ---------------------------------------------------------------------------

pub struct FakeAudioBackend {
    script: Script,
    pub connected: bool,
}

impl FakeAudioBackend {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(steps),
            connected: false,
        })
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl AudioBackend for FakeAudioBackend {
    async fn check_connection(&self) -> bool {
        self.connected
    }

    async fn list_speakers(&self) -> Result<Vec<Speaker>, BackendError> {
        Ok(vec![Speaker {
            id: 3,
            name: "Zundamon (Normal)".into(),
            speaker_name: "Zundamon".into(),
            style_name: "Normal".into(),
        }])
    }

    async fn generate_audio(
        &self,
        params: &AudioParams,
        cancel: &CancellationToken,
    ) -> Result<GeneratedAudio, BackendError> {
        let (_, step) = self.script.next();
        let save = params.save_file;
        play(step, cancel, || GeneratedAudio {
            bytes: vec![0u8; 128],
            file_path: save.then(|| "/out/audio.wav".to_string()),
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Store whose every write fails.
pub struct FailingStore;

#[async_trait]
impl ArtifactStore for FailingStore {
    async fn save_image_metadata(&self, _artifact: &ImageArtifact) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list_images(&self) -> Result<Vec<ImageArtifact>, StoreError> {
        Ok(vec![])
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub manager: JobManager,
    pub image: Arc<FakeImageBackend>,
    pub audio: Arc<FakeAudioBackend>,
    pub store: Arc<MemoryArtifactStore>,
}

pub fn harness(image_steps: Vec<Step>, audio_steps: Vec<Step>) -> Harness {
    let image = FakeImageBackend::new(image_steps);
    let audio = FakeAudioBackend::new(audio_steps);
    let store = Arc::new(MemoryArtifactStore::new());
    let manager = JobManager::new(
        image.clone(),
        audio.clone(),
        store.clone(),
        EngineSettings {
            defaults: GenerationDefaults::default(),
            unit_delay: Duration::ZERO,
        },
    );
    Harness {
        manager,
        image,
        audio,
        store,
    }
}

/// Poll until the job reaches a terminal state.
pub async fn wait_terminal(manager: &JobManager, id: &str) -> JobSnapshot {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snap = manager.get(id).expect("job should exist");
            if snap.status.is_terminal() {
                return snap;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job should reach a terminal state")
}

/// Poll until `f` returns true.
pub async fn wait_until(mut f: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !f() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition should become true");
}
