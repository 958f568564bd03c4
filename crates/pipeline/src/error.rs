use std::path::PathBuf;

use inkwell_core::generation::GenerationError;
use inkwell_core::job::ErrorKind;
use inkwell_core::types::JobKey;

use crate::collaborators::BoxError;

/// Failures of a workflow run.
///
/// Precondition variants are detected before any provider call. The
/// `Display` text is what a polling client sees after the `error: ` prefix.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("prerequisite analysis missing for entry {0}")]
    MissingContext(JobKey),

    #[error("{0} is blank")]
    BlankInput(&'static str),

    #[error("invalid character type '{0}'")]
    InvalidSubject(String),

    #[error("no base asset for character '{subject}' in {}", root.display())]
    MissingAsset { subject: String, root: PathBuf },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("context lookup failed: {0}")]
    ContextLookup(#[source] BoxError),

    #[error("asset lookup failed: {0}")]
    AssetLookup(#[source] std::io::Error),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("saving results failed: {0}")]
    Persist(#[source] BoxError),
}

impl PipelineError {
    /// Machine-readable category for the job record and HTTP error body.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MissingContext(_)
            | PipelineError::BlankInput(_)
            | PipelineError::InvalidSubject(_)
            | PipelineError::MissingAsset { .. }
            | PipelineError::InvalidParameters(_) => ErrorKind::Precondition,
            PipelineError::ContextLookup(_)
            | PipelineError::AssetLookup(_)
            | PipelineError::Persist(_) => ErrorKind::Io,
            PipelineError::Generation(e) => e.kind(),
        }
    }
}
