//! Submission validation.
//!
//! Every check runs before a job is created, so a rejected request never
//! reaches the registry. Pipeline requests are validated while they are
//! converted into a plan (see [`crate::pipeline::PipelineRequest::into_plan`]).

use crate::audio::AudioParams;
use crate::error::CoreError;
use crate::image::{BatchImageRequest, ImageGenerationRequest};

pub const MIN_STEPS: u32 = 1;
pub const MAX_STEPS: u32 = 150;
pub const MIN_CFG_SCALE: f64 = 1.0;
pub const MAX_CFG_SCALE: f64 = 30.0;
pub const MIN_DIMENSION: u32 = 64;
pub const MAX_DIMENSION: u32 = 2048;
pub const MAX_LORA_WEIGHT: f64 = 2.0;
pub const MAX_BATCH_COUNT: u32 = 100;

pub const MAX_AUDIO_TEXT_LEN: usize = 10_000;
pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 2.0;
pub const MAX_PITCH: f64 = 0.15;
pub const MAX_INTONATION: f64 = 2.0;
pub const MAX_VOLUME: f64 = 2.0;

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// Validate a resolved single-image request.
///
/// Rules:
/// - prompt must not be blank
/// - `char_name` must be usable as a file name prefix
/// - tuning parameters within the ranges accepted by the backend
/// - `batch_count` in `1..=MAX_BATCH_COUNT`
pub fn validate_image_request(req: &ImageGenerationRequest) -> Result<(), CoreError> {
    if req.prompt.trim().is_empty() {
        return Err(CoreError::Validation("prompt is required".to_string()));
    }
    validate_file_stem("char_name", &req.char_name)?;
    validate_steps(req.steps)?;
    validate_cfg_scale(req.cfg_scale)?;
    validate_dimension("width", req.width)?;
    validate_dimension("height", req.height)?;
    validate_lora_weight(req.lora_weight)?;
    validate_batch_count(req.batch_count)
}

/// Validate a batch submission.
///
/// Only parameters the caller actually supplied are range-checked; absent
/// ones resolve to defaults that are valid by construction.
pub fn validate_batch_request(req: &BatchImageRequest) -> Result<(), CoreError> {
    if req.characters.is_empty() {
        return Err(CoreError::Validation(
            "characters must not be empty".to_string(),
        ));
    }
    for (i, character) in req.characters.iter().enumerate() {
        if character.prompt.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Character at index {i} has an empty prompt"
            )));
        }
        if character.file_name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Character at index {i} has an empty file_name"
            )));
        }
        validate_file_stem("file_name", &character.file_name)?;
    }

    if let Some(steps) = req.steps {
        validate_steps(steps)?;
    }
    if let Some(cfg) = req.cfg_scale {
        validate_cfg_scale(cfg)?;
    }
    if let Some(width) = req.width {
        validate_dimension("width", width)?;
    }
    if let Some(height) = req.height {
        validate_dimension("height", height)?;
    }
    if let Some(weight) = req.lora_weight {
        validate_lora_weight(weight)?;
    }
    validate_batch_count(req.batch_count)
}

fn validate_steps(steps: u32) -> Result<(), CoreError> {
    if !(MIN_STEPS..=MAX_STEPS).contains(&steps) {
        return Err(CoreError::Validation(format!(
            "steps must be between {MIN_STEPS} and {MAX_STEPS}"
        )));
    }
    Ok(())
}

fn validate_cfg_scale(cfg: f64) -> Result<(), CoreError> {
    if !(MIN_CFG_SCALE..=MAX_CFG_SCALE).contains(&cfg) {
        return Err(CoreError::Validation(format!(
            "cfg_scale must be between {MIN_CFG_SCALE} and {MAX_CFG_SCALE}"
        )));
    }
    Ok(())
}

fn validate_dimension(field: &str, value: u32) -> Result<(), CoreError> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{field} must be between {MIN_DIMENSION} and {MAX_DIMENSION}"
        )));
    }
    if value % 8 != 0 {
        return Err(CoreError::Validation(format!(
            "{field} must be a multiple of 8"
        )));
    }
    Ok(())
}

fn validate_lora_weight(weight: f64) -> Result<(), CoreError> {
    if !(0.0..=MAX_LORA_WEIGHT).contains(&weight) {
        return Err(CoreError::Validation(format!(
            "lora_weight must be between 0 and {MAX_LORA_WEIGHT}"
        )));
    }
    Ok(())
}

fn validate_batch_count(count: u32) -> Result<(), CoreError> {
    if !(1..=MAX_BATCH_COUNT).contains(&count) {
        return Err(CoreError::Validation(format!(
            "batch_count must be between 1 and {MAX_BATCH_COUNT}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Validate resolved speech synthesis parameters.
pub fn validate_audio_request(params: &AudioParams) -> Result<(), CoreError> {
    if params.text.trim().is_empty() {
        return Err(CoreError::Validation("text is required".to_string()));
    }
    if params.text.chars().count() > MAX_AUDIO_TEXT_LEN {
        return Err(CoreError::Validation(format!(
            "text must not exceed {MAX_AUDIO_TEXT_LEN} characters"
        )));
    }
    if !(MIN_SPEED..=MAX_SPEED).contains(&params.speed) {
        return Err(CoreError::Validation(format!(
            "speed must be between {MIN_SPEED} and {MAX_SPEED}"
        )));
    }
    if !(-MAX_PITCH..=MAX_PITCH).contains(&params.pitch) {
        return Err(CoreError::Validation(format!(
            "pitch must be between -{MAX_PITCH} and {MAX_PITCH}"
        )));
    }
    if !(0.0..=MAX_INTONATION).contains(&params.intonation) {
        return Err(CoreError::Validation(format!(
            "intonation must be between 0 and {MAX_INTONATION}"
        )));
    }
    if !(0.0..=MAX_VOLUME).contains(&params.volume) {
        return Err(CoreError::Validation(format!(
            "volume must be between 0 and {MAX_VOLUME}"
        )));
    }
    if let Some(name) = &params.file_name {
        validate_file_stem("file_name", name)?;
    }
    Ok(())
}

/// A file stem is safe when it cannot leave the output directory.
pub(crate) fn is_safe_file_stem(name: &str) -> bool {
    !(name.contains("..") || name.contains('/') || name.contains('\\'))
}

/// Reject names that could escape the output directory.
fn validate_file_stem(field: &str, name: &str) -> Result<(), CoreError> {
    if !is_safe_file_stem(name) {
        return Err(CoreError::Validation(format!(
            "{field} must not contain path separators or '..'"
        )));
    }
    Ok(())
}
