//! Request handlers for the `/api/v1` tree.
//!
//! Submission handlers validate through [`mediagen_jobs::JobManager`] and
//! answer `202 Accepted` with the queued job; catalog handlers call the
//! generation backends directly. Errors map via [`crate::error::AppError`].

pub mod audio;
pub mod images;
pub mod jobs;
pub mod models;
pub mod pipelines;
pub mod system;
