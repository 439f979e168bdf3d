//! Domain types shared by every mediagen crate.
//!
//! Holds the generation request/artifact models, job lifecycle enums,
//! the typed pipeline step model, request validation, and the default
//! generation parameters. Has no internal workspace dependencies.

pub mod audio;
pub mod defaults;
pub mod error;
pub mod image;
pub mod job;
pub mod pipeline;
pub mod types;
pub mod validation;
