//! Default generation parameters.
//!
//! Any request field left empty (and any pipeline parameter that is
//! missing or unparseable) falls back to the values held here.

use serde::Serialize;

pub const DEFAULT_MODEL: &str = "dreamshaper_8.safetensors";
pub const DEFAULT_SAMPLER: &str = "DPM++ 2M Karras";
pub const DEFAULT_STEPS: u32 = 30;
pub const DEFAULT_CFG_SCALE: f64 = 6.0;
pub const DEFAULT_WIDTH: u32 = 768;
pub const DEFAULT_HEIGHT: u32 = 768;
pub const DEFAULT_LORA_WEIGHT: f64 = 0.8;
pub const DEFAULT_SPEAKER_ID: i64 = 3;

/// Fallback values for image and audio generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationDefaults {
    pub model: String,
    pub sampler: String,
    pub steps: u32,
    pub cfg_scale: f64,
    pub width: u32,
    pub height: u32,
    pub lora_weight: f64,
    pub speaker_id: i64,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            sampler: DEFAULT_SAMPLER.to_string(),
            steps: DEFAULT_STEPS,
            cfg_scale: DEFAULT_CFG_SCALE,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            lora_weight: DEFAULT_LORA_WEIGHT,
            speaker_id: DEFAULT_SPEAKER_ID,
        }
    }
}
