//! Generation backends and artifact persistence.
//!
//! Provides the [`ImageBackend`] and [`AudioBackend`] traits consumed by
//! the job engine, HTTP clients for the Stable Diffusion WebUI and
//! VOICEVOX engines, and the [`ArtifactStore`] that records metadata for
//! every generated image.

pub mod backend;
pub mod error;
pub mod stable_diffusion;
pub mod store;
pub mod voicevox;

pub use backend::{AudioBackend, ImageBackend};
pub use error::{BackendError, StoreError};
pub use stable_diffusion::StableDiffusionClient;
pub use store::{ArtifactStore, MemoryArtifactStore, PgArtifactStore};
pub use voicevox::VoicevoxClient;
