//! Image generation models.
//!
//! [`ImageGenerateRequest`] and [`BatchImageRequest`] are the submission
//! bodies accepted from callers, with every tuning parameter optional.
//! They resolve against [`GenerationDefaults`] into a fully-populated
//! [`ImageGenerationRequest`], which is what the image backend receives.

use serde::{Deserialize, Serialize};

use crate::defaults::GenerationDefaults;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Backend-facing request and artifact
// ---------------------------------------------------------------------------

/// Fully-resolved parameters for one image backend call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub model: String,
    pub lora: Option<String>,
    pub lora_weight: f64,
    pub steps: u32,
    pub cfg_scale: f64,
    pub width: u32,
    pub height: u32,
    pub sampler: String,
    /// Base name for the generated files.
    pub char_name: String,
    /// Prompt file the request originated from, if any.
    pub json_file_id: Option<i64>,
    /// Images per backend call; used only for output file naming.
    pub batch_count: u32,
}

/// Metadata describing one generated image file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub file_name: String,
    pub file_path: String,
    pub timestamp: Timestamp,
    pub model: Option<String>,
    pub lora: Option<String>,
    pub lora_weight: f64,
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub sampler: String,
    pub cfg_scale: f64,
    pub char_name: String,
    pub json_file_id: Option<i64>,
    /// 1-based position within the backend call that produced it.
    pub batch_index: u32,
}

impl ImageArtifact {
    /// Describe a file produced for `request`.
    pub fn from_request(
        request: &ImageGenerationRequest,
        file_name: String,
        file_path: String,
        batch_index: u32,
    ) -> Self {
        Self {
            file_name,
            file_path,
            timestamp: chrono::Utc::now(),
            model: Some(request.model.clone()),
            lora: request.lora.clone(),
            lora_weight: request.lora_weight,
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            steps: request.steps,
            width: request.width,
            height: request.height,
            sampler: request.sampler.clone(),
            cfg_scale: request.cfg_scale,
            char_name: request.char_name.clone(),
            json_file_id: request.json_file_id,
            batch_index,
        }
    }
}

// ---------------------------------------------------------------------------
// Submission bodies
// ---------------------------------------------------------------------------

fn default_char_name() -> String {
    "image".to_string()
}

fn default_batch_count() -> u32 {
    1
}

/// Body of a single-image job submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageGenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    pub model: Option<String>,
    pub lora: Option<String>,
    pub lora_weight: Option<f64>,
    pub steps: Option<u32>,
    pub cfg_scale: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sampler: Option<String>,
    #[serde(default = "default_char_name")]
    pub char_name: String,
    /// Number of sequential backend calls ("sets") to make.
    #[serde(default = "default_batch_count")]
    pub batch_count: u32,
}

impl ImageGenerateRequest {
    /// Fill every absent parameter from `defaults`.
    pub fn resolve(&self, defaults: &GenerationDefaults) -> ImageGenerationRequest {
        ImageGenerationRequest {
            prompt: self.prompt.clone(),
            negative_prompt: self.negative_prompt.clone(),
            model: self.model.clone().unwrap_or_else(|| defaults.model.clone()),
            lora: self.lora.clone(),
            lora_weight: self.lora_weight.unwrap_or(defaults.lora_weight),
            steps: self.steps.unwrap_or(defaults.steps),
            cfg_scale: self.cfg_scale.unwrap_or(defaults.cfg_scale),
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            sampler: self
                .sampler
                .clone()
                .unwrap_or_else(|| defaults.sampler.clone()),
            char_name: self.char_name.clone(),
            json_file_id: None,
            batch_count: self.batch_count,
        }
    }
}

/// One character entry of a batch submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterPrompt {
    pub name: String,
    #[serde(default)]
    pub file_name: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
}

/// Body of a multi-character batch job submission.
///
/// Every character is generated `batch_count` times; the tuning
/// parameters are shared by all of them.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchImageRequest {
    pub json_file_id: Option<i64>,
    #[serde(default)]
    pub characters: Vec<CharacterPrompt>,
    pub model: Option<String>,
    pub lora: Option<String>,
    pub lora_weight: Option<f64>,
    pub steps: Option<u32>,
    pub cfg_scale: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sampler: Option<String>,
    #[serde(default = "default_batch_count")]
    pub batch_count: u32,
}

impl BatchImageRequest {
    /// Build the backend request for a single unit of `character`.
    ///
    /// Each unit produces one image, named after the character's
    /// `file_name`.
    pub fn resolve_for(
        &self,
        character: &CharacterPrompt,
        defaults: &GenerationDefaults,
    ) -> ImageGenerationRequest {
        ImageGenerationRequest {
            prompt: character.prompt.clone(),
            negative_prompt: character.negative_prompt.clone(),
            model: self.model.clone().unwrap_or_else(|| defaults.model.clone()),
            lora: self.lora.clone(),
            lora_weight: self.lora_weight.unwrap_or(defaults.lora_weight),
            steps: self.steps.unwrap_or(defaults.steps),
            cfg_scale: self.cfg_scale.unwrap_or(defaults.cfg_scale),
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            sampler: self
                .sampler
                .clone()
                .unwrap_or_else(|| defaults.sampler.clone()),
            char_name: character.file_name.clone(),
            json_file_id: self.json_file_id,
            batch_count: 1,
        }
    }

    /// Total number of backend calls the batch will make.
    pub fn total_units(&self) -> usize {
        self.characters.len() * self.batch_count as usize
    }
}

// ---------------------------------------------------------------------------
// Capability listings
// ---------------------------------------------------------------------------

/// Sampler algorithms offered to callers.
pub const SAMPLERS: &[&str] = &[
    "DPM++ 2M Karras",
    "DPM++ SDE Karras",
    "DPM++ 2M SDE Karras",
    "Euler a",
    "Euler",
    "Heun",
    "LMS",
    "DDIM",
];

/// A recommended output resolution.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub label: &'static str,
}

pub const RESOLUTIONS: &[Resolution] = &[
    Resolution { width: 512, height: 512, label: "512x512" },
    Resolution { width: 768, height: 768, label: "768x768" },
    Resolution { width: 1024, height: 1024, label: "1024x1024" },
    Resolution { width: 512, height: 768, label: "512x768 (Portrait)" },
    Resolution { width: 768, height: 512, label: "768x512 (Landscape)" },
];
