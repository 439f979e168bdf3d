//! Client for the VOICEVOX engine HTTP API.
//!
//! Synthesis is a two-call exchange: `POST /audio_query` builds a query
//! object for the text and speaker, the prosody scales are patched into
//! it, and `POST /synthesis` turns it into WAV bytes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mediagen_core::audio::{AudioParams, GeneratedAudio, Speaker};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::backend::{with_cancel, AudioBackend};
use crate::error::BackendError;
use crate::stable_diffusion::{ensure_success, parse_response};

/// HTTP client for a single VOICEVOX engine.
pub struct VoicevoxClient {
    client: reqwest::Client,
    api_url: String,
    output_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawSpeaker {
    #[serde(default)]
    name: String,
    #[serde(default)]
    styles: Vec<RawStyle>,
}

#[derive(Debug, Deserialize)]
struct RawStyle {
    id: i64,
    #[serde(default)]
    name: String,
}

impl VoicevoxClient {
    /// * `api_url` - Base HTTP URL, e.g. `http://127.0.0.1:50021`.
    /// * `output_dir` - Directory saved WAV files are written to.
    pub fn new(api_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn synthesize(&self, params: &AudioParams) -> Result<Vec<u8>, BackendError> {
        let speaker = params.speaker_id.to_string();

        let response = self
            .client
            .post(format!("{}/audio_query", self.api_url))
            .query(&[("text", params.text.as_str()), ("speaker", speaker.as_str())])
            .send()
            .await?;
        let mut query: serde_json::Value = parse_response(response).await?;
        apply_prosody(&mut query, params)?;

        let response = self
            .client
            .post(format!("{}/synthesis", self.api_url))
            .query(&[("speaker", speaker.as_str())])
            .json(&query)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn save(&self, params: &AudioParams, bytes: &[u8]) -> Result<String, BackendError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let file_name = audio_file_name(
            params.file_name.as_deref(),
            chrono::Utc::now().timestamp_millis(),
        );
        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(file = %path.display(), size = bytes.len(), "Audio written");
        Ok(path.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl AudioBackend for VoicevoxClient {
    async fn check_connection(&self) -> bool {
        match self
            .client
            .get(format!("{}/version", self.api_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "VOICEVOX unreachable");
                false
            }
        }
    }

    async fn list_speakers(&self) -> Result<Vec<Speaker>, BackendError> {
        let response = self
            .client
            .get(format!("{}/speakers", self.api_url))
            .send()
            .await?;
        let raw: Vec<RawSpeaker> = parse_response(response).await?;
        Ok(flatten_speakers(raw))
    }

    async fn generate_audio(
        &self,
        params: &AudioParams,
        cancel: &CancellationToken,
    ) -> Result<GeneratedAudio, BackendError> {
        let bytes = with_cancel(cancel, self.synthesize(params)).await?;

        let file_path = if params.save_file {
            Some(with_cancel(cancel, self.save(params, &bytes)).await?)
        } else {
            None
        };

        Ok(GeneratedAudio { bytes, file_path })
    }
}

/// One [`Speaker`] per speaker/style pair.
fn flatten_speakers(raw: Vec<RawSpeaker>) -> Vec<Speaker> {
    raw.into_iter()
        .flat_map(|speaker| {
            let speaker_name = speaker.name;
            speaker.styles.into_iter().map(move |style| Speaker {
                id: style.id,
                name: format!("{speaker_name} ({})", style.name),
                speaker_name: speaker_name.clone(),
                style_name: style.name,
            })
        })
        .collect()
}

fn apply_prosody(query: &mut serde_json::Value, params: &AudioParams) -> Result<(), BackendError> {
    let obj = query
        .as_object_mut()
        .ok_or_else(|| BackendError::Decode("Failed to create audio query".to_string()))?;
    obj.insert("speedScale".into(), params.speed.into());
    obj.insert("pitchScale".into(), params.pitch.into());
    obj.insert("intonationScale".into(), params.intonation.into());
    obj.insert("volumeScale".into(), params.volume.into());
    Ok(())
}

/// `audio_{millis}.wav` unless a name was given; `.wav` is appended when
/// missing.
pub fn audio_file_name(requested: Option<&str>, millis: i64) -> String {
    match requested.filter(|n| !n.is_empty()) {
        Some(name) if name.ends_with(".wav") => name.to_string(),
        Some(name) => format!("{name}.wav"),
        None => format!("audio_{millis}.wav"),
    }
}
