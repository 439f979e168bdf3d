//! Backend traits consumed by the job engine.
//!
//! Every generate call receives the job's [`CancellationToken`]; an
//! implementation must abandon in-flight work and return
//! [`BackendError::Cancelled`] once the token fires.

use async_trait::async_trait;
use mediagen_core::audio::{AudioParams, GeneratedAudio, Speaker};
use mediagen_core::image::{ImageArtifact, ImageGenerationRequest};
use tokio_util::sync::CancellationToken;

use crate::error::BackendError;

/// Text-to-image engine.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Connectivity probe. Never errors; an unreachable engine is `false`.
    async fn check_connection(&self) -> bool;

    async fn list_models(&self) -> Result<Vec<String>, BackendError>;

    async fn list_loras(&self) -> Result<Vec<String>, BackendError>;

    /// Generate images for `request`, writing them to the output
    /// directory and returning one artifact per file.
    async fn generate(
        &self,
        request: &ImageGenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImageArtifact>, BackendError>;
}

/// Text-to-speech engine.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    async fn check_connection(&self) -> bool;

    async fn list_speakers(&self) -> Result<Vec<Speaker>, BackendError>;

    async fn generate_audio(
        &self,
        params: &AudioParams,
        cancel: &CancellationToken,
    ) -> Result<GeneratedAudio, BackendError>;
}

/// Race `fut` against `cancel`, returning [`BackendError::Cancelled`] if
/// the token fires first. A token that is already cancelled wins.
pub async fn with_cancel<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, BackendError>
where
    F: std::future::Future<Output = Result<T, BackendError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BackendError::Cancelled),
        res = fut => res,
    }
}
