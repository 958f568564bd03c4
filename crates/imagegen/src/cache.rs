//! On-disk artifact cache keyed by job key.
//!
//! Every job writes exactly two files, named by [`ImageRole::file_name`].
//! The cache key is the job key, not a content hash: re-running a job with
//! caching enabled returns whatever is on disk for that key.

use std::path::PathBuf;

use inkwell_core::generation::{GeneratedImages, ImageRole};
use inkwell_core::types::JobKey;

use crate::config::MediaConfig;

/// Filesystem location and public URL prefix of generated artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
    url_prefix: String,
}

impl ArtifactCache {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Path of the artifact for `key` and `role`.
    pub fn path(&self, key: JobKey, role: ImageRole) -> PathBuf {
        self.root.join(role.file_name(key))
    }

    /// Public reference of the artifact for `key` and `role`.
    pub fn url(&self, key: JobKey, role: ImageRole) -> String {
        format!("{}/{}", self.url_prefix, role.file_name(key))
    }

    /// References to both artifacts for `key`, regardless of whether they
    /// exist.
    pub fn references(&self, key: JobKey) -> GeneratedImages {
        GeneratedImages {
            keyword_image: self.url(key, ImageRole::Keyword),
            character_image: self.url(key, ImageRole::Character),
        }
    }

    /// Return references to both artifacts if both exist on disk.
    pub async fn lookup(&self, key: JobKey) -> std::io::Result<Option<GeneratedImages>> {
        let keyword = tokio::fs::try_exists(self.path(key, ImageRole::Keyword)).await?;
        let character = tokio::fs::try_exists(self.path(key, ImageRole::Character)).await?;

        if keyword && character {
            Ok(Some(self.references(key)))
        } else {
            Ok(None)
        }
    }

    /// Write an artifact and return its public reference.
    ///
    /// Bytes go to a temporary sibling first and are renamed into place, so a
    /// partially written file never satisfies [`lookup`](Self::lookup).
    pub async fn store(
        &self,
        key: JobKey,
        role: ImageRole,
        bytes: &[u8],
    ) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.path(key, role);
        let tmp = path.with_extension("png.part");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(
            job_key = key,
            role = role.as_str(),
            path = %path.display(),
            bytes = bytes.len(),
            "Artifact written",
        );

        Ok(self.url(key, role))
    }
}
