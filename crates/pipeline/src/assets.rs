//! Filesystem-backed character asset lookup.

use std::path::PathBuf;

use crate::collaborators::AssetResolver;
use crate::error::PipelineError;

/// Extensions tried, in order, when resolving a character asset.
pub const ASSET_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Resolves `{root}/{subject_type}.{ext}` for the first existing extension.
#[derive(Debug, Clone)]
pub struct FsAssetResolver {
    root: PathBuf,
}

impl FsAssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Reject subject types that would escape the asset directory.
fn validate_subject(subject_type: &str) -> Result<&str, PipelineError> {
    let subject = subject_type.trim();
    if subject.is_empty()
        || subject.contains(['/', '\\'])
        || subject.contains("..")
        || subject.starts_with('.')
    {
        return Err(PipelineError::InvalidSubject(subject_type.to_string()));
    }
    Ok(subject)
}

#[async_trait::async_trait]
impl AssetResolver for FsAssetResolver {
    async fn resolve(&self, subject_type: &str) -> Result<PathBuf, PipelineError> {
        let subject = validate_subject(subject_type)?;

        for ext in ASSET_EXTENSIONS {
            let candidate = self.root.join(format!("{subject}.{ext}"));
            if tokio::fs::try_exists(&candidate)
                .await
                .map_err(PipelineError::AssetLookup)?
            {
                return Ok(candidate);
            }
        }

        Err(PipelineError::MissingAsset {
            subject: subject.to_string(),
            root: self.root.clone(),
        })
    }
}
