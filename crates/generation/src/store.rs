//! Artifact metadata persistence.

use std::collections::VecDeque;

use async_trait::async_trait;
use mediagen_core::image::ImageArtifact;
use mediagen_db::models::image::CreateGeneratedImage;
use mediagen_db::repositories::ImageRepo;
use mediagen_db::DbPool;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Maximum rows returned by [`ArtifactStore::list_images`].
pub const LIST_LIMIT: i64 = 500;

/// Records metadata for every generated image.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn save_image_metadata(&self, artifact: &ImageArtifact) -> Result<(), StoreError>;

    /// Stored images, most recent first.
    async fn list_images(&self) -> Result<Vec<ImageArtifact>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-lifetime store used when no database is configured.
///
/// Keeps only the newest [`LIST_LIMIT`] entries; older ones are dropped
/// on insert.
pub struct MemoryArtifactStore {
    images: RwLock<VecDeque<ImageArtifact>>,
    capacity: usize,
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::with_capacity(LIST_LIMIT as usize)
    }
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            images: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn save_image_metadata(&self, artifact: &ImageArtifact) -> Result<(), StoreError> {
        let mut images = self.images.write().await;
        if images.len() >= self.capacity {
            images.pop_front();
        }
        images.push_back(artifact.clone());
        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<ImageArtifact>, StoreError> {
        let images = self.images.read().await;
        Ok(images.iter().rev().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// Store backed by the `generated_images` table.
pub struct PgArtifactStore {
    pool: DbPool,
}

impl PgArtifactStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtifactStore for PgArtifactStore {
    async fn save_image_metadata(&self, artifact: &ImageArtifact) -> Result<(), StoreError> {
        let row = ImageRepo::create(&self.pool, &CreateGeneratedImage::from(artifact)).await?;
        tracing::debug!(id = row.id, file = %row.file_name, "Image metadata saved");
        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<ImageArtifact>, StoreError> {
        let rows = ImageRepo::list(&self.pool, LIST_LIMIT).await?;
        Ok(rows.into_iter().map(ImageArtifact::from).collect())
    }
}
