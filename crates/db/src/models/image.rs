//! Models for the `generated_images` table.

use mediagen_core::image::ImageArtifact;
use mediagen_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `generated_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GeneratedImage {
    pub id: DbId,
    pub file_name: String,
    pub file_path: String,
    pub model: Option<String>,
    pub lora: Option<String>,
    pub lora_weight: f64,
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: i32,
    pub width: i32,
    pub height: i32,
    pub sampler: String,
    pub cfg_scale: f64,
    pub char_name: String,
    pub json_file_id: Option<DbId>,
    pub batch_index: i32,
    pub generated_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for inserting a generated image.
#[derive(Debug, Clone)]
pub struct CreateGeneratedImage {
    pub file_name: String,
    pub file_path: String,
    pub model: Option<String>,
    pub lora: Option<String>,
    pub lora_weight: f64,
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: i32,
    pub width: i32,
    pub height: i32,
    pub sampler: String,
    pub cfg_scale: f64,
    pub char_name: String,
    pub json_file_id: Option<DbId>,
    pub batch_index: i32,
    pub generated_at: Timestamp,
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn to_u32(v: i32) -> u32 {
    u32::try_from(v).unwrap_or(0)
}

impl From<&ImageArtifact> for CreateGeneratedImage {
    fn from(a: &ImageArtifact) -> Self {
        Self {
            file_name: a.file_name.clone(),
            file_path: a.file_path.clone(),
            model: a.model.clone(),
            lora: a.lora.clone(),
            lora_weight: a.lora_weight,
            prompt: a.prompt.clone(),
            negative_prompt: a.negative_prompt.clone(),
            steps: to_i32(a.steps),
            width: to_i32(a.width),
            height: to_i32(a.height),
            sampler: a.sampler.clone(),
            cfg_scale: a.cfg_scale,
            char_name: a.char_name.clone(),
            json_file_id: a.json_file_id,
            batch_index: to_i32(a.batch_index),
            generated_at: a.timestamp,
        }
    }
}

impl From<GeneratedImage> for ImageArtifact {
    fn from(row: GeneratedImage) -> Self {
        Self {
            file_name: row.file_name,
            file_path: row.file_path,
            timestamp: row.generated_at,
            model: row.model,
            lora: row.lora,
            lora_weight: row.lora_weight,
            prompt: row.prompt,
            negative_prompt: row.negative_prompt,
            steps: to_u32(row.steps),
            width: to_u32(row.width),
            height: to_u32(row.height),
            sampler: row.sampler,
            cfg_scale: row.cfg_scale,
            char_name: row.char_name,
            json_file_id: row.json_file_id,
            batch_index: to_u32(row.batch_index),
        }
    }
}
