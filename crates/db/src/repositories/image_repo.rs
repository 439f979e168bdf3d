//! Repository for the `generated_images` table.

use sqlx::PgPool;

use crate::models::image::{CreateGeneratedImage, GeneratedImage};

/// Column list shared across queries.
const COLUMNS: &str = "id, file_name, file_path, model, lora, lora_weight, prompt, \
    negative_prompt, steps, width, height, sampler, cfg_scale, char_name, json_file_id, \
    batch_index, generated_at, created_at";

/// Persistence for generated image metadata.
pub struct ImageRepo;

impl ImageRepo {
    /// Insert a generated image, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateGeneratedImage,
    ) -> Result<GeneratedImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO generated_images
                (file_name, file_path, model, lora, lora_weight, prompt, negative_prompt,
                 steps, width, height, sampler, cfg_scale, char_name, json_file_id,
                 batch_index, generated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GeneratedImage>(&query)
            .bind(&input.file_name)
            .bind(&input.file_path)
            .bind(&input.model)
            .bind(&input.lora)
            .bind(input.lora_weight)
            .bind(&input.prompt)
            .bind(&input.negative_prompt)
            .bind(input.steps)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.sampler)
            .bind(input.cfg_scale)
            .bind(&input.char_name)
            .bind(input.json_file_id)
            .bind(input.batch_index)
            .bind(input.generated_at)
            .fetch_one(pool)
            .await
    }

    /// List generated images, most recently generated first.
    pub async fn list(pool: &PgPool, limit: i64) -> Result<Vec<GeneratedImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generated_images
             ORDER BY generated_at DESC, id DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, GeneratedImage>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// List images generated for one character name.
    pub async fn list_by_char_name(
        pool: &PgPool,
        char_name: &str,
    ) -> Result<Vec<GeneratedImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generated_images
             WHERE char_name = $1
             ORDER BY generated_at DESC, id DESC"
        );
        sqlx::query_as::<_, GeneratedImage>(&query)
            .bind(char_name)
            .fetch_all(pool)
            .await
    }
}
