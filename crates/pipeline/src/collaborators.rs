//! Narrow contracts for the collaborators the workflow consumes.

use std::path::PathBuf;

use inkwell_core::context::JobContext;
use inkwell_core::generation::GenerationResult;
use inkwell_core::types::JobKey;

use crate::error::PipelineError;

/// Error type returned by external collaborators (database, storage).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Looks up the prompt material and persistence IDs for a job key.
#[async_trait::async_trait]
pub trait ContextResolver: Send + Sync {
    /// `Ok(None)` when the entry has no analysis yet.
    async fn resolve(&self, key: JobKey) -> Result<Option<JobContext>, BoxError>;
}

/// Maps a character type to its base image file.
#[async_trait::async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve(&self, subject_type: &str) -> Result<PathBuf, PipelineError>;
}

/// Persists the artifact references of a finished run.
///
/// Implementations upsert by `(analysis_id, user_id)`, so repeated runs for
/// the same context overwrite rather than duplicate.
#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    async fn save(&self, result: &GenerationResult) -> Result<(), BoxError>;
}
