//! Diary illustration workflow.
//!
//! [`workflow::GenerationWorkflow`] sequences context lookup, asset
//! resolution, image generation and result persistence. The same step
//! sequence backs both the tracked (async) path, which reports into the job
//! state store, and the synchronous path, which returns the result directly.

pub mod assets;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod workflow;

pub use error::PipelineError;
pub use workflow::{GenerationWorkflow, JobParams};
