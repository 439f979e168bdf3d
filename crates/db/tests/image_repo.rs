//! Integration tests for the generated image repository.

use chrono::{Duration, Utc};
use mediagen_core::image::ImageArtifact;
use mediagen_db::models::image::CreateGeneratedImage;
use mediagen_db::repositories::ImageRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_image(char_name: &str, file_name: &str, age_secs: i64) -> CreateGeneratedImage {
    CreateGeneratedImage {
        file_name: file_name.to_string(),
        file_path: format!("/data/images/{file_name}"),
        model: Some("dreamshaper_8.safetensors".to_string()),
        lora: None,
        lora_weight: 0.8,
        prompt: "a knight".to_string(),
        negative_prompt: String::new(),
        steps: 30,
        width: 768,
        height: 768,
        sampler: "Euler a".to_string(),
        cfg_scale: 6.0,
        char_name: char_name.to_string(),
        json_file_id: None,
        batch_index: 1,
        generated_at: Utc::now() - Duration::seconds(age_secs),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_returns_row(pool: PgPool) {
    let row = ImageRepo::create(&pool, &new_image("alice", "alice_1.png", 0))
        .await
        .unwrap();

    assert!(row.id > 0);
    assert_eq!(row.char_name, "alice");
    assert_eq!(row.width, 768);

    let artifact = ImageArtifact::from(row);
    assert_eq!(artifact.file_name, "alice_1.png");
    assert_eq!(artifact.steps, 30);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_newest_first(pool: PgPool) {
    ImageRepo::create(&pool, &new_image("a", "old.png", 60))
        .await
        .unwrap();
    ImageRepo::create(&pool, &new_image("a", "new.png", 0))
        .await
        .unwrap();

    let rows = ImageRepo::list(&pool, 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].file_name, "new.png");

    let limited = ImageRepo::list(&pool, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_by_char_name(pool: PgPool) {
    ImageRepo::create(&pool, &new_image("alice", "a.png", 0))
        .await
        .unwrap();
    ImageRepo::create(&pool, &new_image("bob", "b.png", 0))
        .await
        .unwrap();

    let rows = ImageRepo::list_by_char_name(&pool, "bob").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].file_name, "b.png");
}
