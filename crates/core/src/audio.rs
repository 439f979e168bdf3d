//! Speech synthesis models.

use serde::{Deserialize, Serialize};

use crate::defaults::GenerationDefaults;

pub const DEFAULT_SPEED: f64 = 1.0;
pub const DEFAULT_PITCH: f64 = 0.0;
pub const DEFAULT_INTONATION: f64 = 1.0;
pub const DEFAULT_VOLUME: f64 = 1.0;

/// Fully-resolved parameters for one speech synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioParams {
    pub text: String,
    pub speaker_id: i64,
    pub speed: f64,
    pub pitch: f64,
    pub intonation: f64,
    pub volume: f64,
    /// Write the synthesized audio to the output directory.
    pub save_file: bool,
    pub file_name: Option<String>,
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

fn default_intonation() -> f64 {
    DEFAULT_INTONATION
}

fn default_volume() -> f64 {
    DEFAULT_VOLUME
}

fn default_save_file() -> bool {
    true
}

/// Body of an audio job submission.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioGenerateRequest {
    pub text: String,
    pub speaker_id: Option<i64>,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default = "default_intonation")]
    pub intonation: f64,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default = "default_save_file")]
    pub save_file: bool,
    pub file_name: Option<String>,
}

impl AudioGenerateRequest {
    pub fn resolve(&self, defaults: &GenerationDefaults) -> AudioParams {
        AudioParams {
            text: self.text.clone(),
            speaker_id: self.speaker_id.unwrap_or(defaults.speaker_id),
            speed: self.speed,
            pitch: self.pitch,
            intonation: self.intonation,
            volume: self.volume,
            save_file: self.save_file,
            file_name: self.file_name.clone(),
        }
    }
}

/// Raw output of the speech synthesis backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAudio {
    /// WAV bytes as returned by the engine.
    pub bytes: Vec<u8>,
    /// Where the audio was written, when `save_file` was requested.
    pub file_path: Option<String>,
}

/// Job-facing description of a synthesized audio clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub file_path: Option<String>,
    pub file_size_bytes: Option<u64>,
}

impl From<&GeneratedAudio> for AudioArtifact {
    fn from(audio: &GeneratedAudio) -> Self {
        Self {
            file_path: audio.file_path.clone(),
            file_size_bytes: Some(audio.bytes.len() as u64),
        }
    }
}

/// One selectable voice (a speaker/style pair).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    /// Style ID passed to the engine as `speaker`.
    pub id: i64,
    /// Display name, `"{speaker_name} ({style_name})"`.
    pub name: String,
    pub speaker_name: String,
    pub style_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_request_defaults() {
        let req: AudioGenerateRequest =
            serde_json::from_value(serde_json::json!({ "text": "hello" })).unwrap();
        let params = req.resolve(&GenerationDefaults::default());

        assert_eq!(params.speaker_id, GenerationDefaults::default().speaker_id);
        assert_eq!(params.speed, DEFAULT_SPEED);
        assert_eq!(params.pitch, DEFAULT_PITCH);
        assert!(params.save_file);
        assert!(params.file_name.is_none());
    }

    #[test]
    fn artifact_reports_byte_size() {
        let audio = GeneratedAudio {
            bytes: vec![0u8; 44],
            file_path: Some("/tmp/a.wav".into()),
        };
        let artifact = AudioArtifact::from(&audio);
        assert_eq!(artifact.file_size_bytes, Some(44));
        assert_eq!(artifact.file_path.as_deref(), Some("/tmp/a.wav"));
    }
}
