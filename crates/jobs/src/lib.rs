//! Asynchronous job orchestration.
//!
//! [`JobManager`] accepts image, batch, audio and pipeline submissions,
//! records each as a job in the [`JobRegistry`], and runs it on its own
//! tokio task against the generation backends. Callers poll snapshots by
//! job id and may cancel any job that has not yet finished. The
//! [`sweeper`] evicts finished jobs once they pass the retention window.

pub mod error;
pub mod manager;
pub mod registry;
mod runner;
pub mod sweeper;

pub use error::JobError;
pub use manager::{EngineSettings, JobManager};
pub use registry::{JobEntry, JobRegistry, JobSnapshot};
