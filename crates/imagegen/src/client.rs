//! [`ImageGenerator`] backed by the provider API and the artifact cache.

use inkwell_core::generation::{
    GeneratedImages, GenerationError, GenerationRequest, ImageGenerator, ImageRole,
};
use inkwell_core::job::checkpoint;
use inkwell_core::progress::ProgressSink;

use crate::api::ImageApi;
use crate::cache::ArtifactCache;
use crate::prompt;

/// Generates the keyword and character illustrations for a job.
///
/// With `use_cache` set, a job whose two artifacts already exist on disk is
/// answered from the cache without any provider call. Otherwise both calls
/// run in order and both files are written only after both succeeded.
pub struct GenerationClient {
    api: ImageApi,
    cache: ArtifactCache,
}

impl GenerationClient {
    pub fn new(api: ImageApi, cache: ArtifactCache) -> Self {
        Self { api, cache }
    }
}

#[async_trait::async_trait]
impl ImageGenerator for GenerationClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<GeneratedImages, GenerationError> {
        let key = request.job_key;

        if request.use_cache {
            if let Some(cached) = self.cache.lookup(key).await? {
                tracing::info!(job_key = key, "Artifacts served from cache");
                return Ok(cached);
            }
        }

        let base_asset = tokio::fs::read(&request.base_asset).await?;
        let asset_name = request
            .base_asset
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("character.png")
            .to_string();

        progress
            .report(checkpoint::KEYWORD_IMAGE, "drawing keyword illustration")
            .await;
        let keyword_bytes = self
            .api
            .text_to_image(&prompt::keyword_prompt(&request.keywords), request.size)
            .await?;
        tracing::info!(job_key = key, bytes = keyword_bytes.len(), "Keyword image generated");

        progress
            .report(checkpoint::CHARACTER_IMAGE, "drawing character illustration")
            .await;
        let character_bytes = self
            .api
            .edit_image(
                &prompt::character_prompt(&request.keywords, &request.subject_type),
                request.size,
                base_asset,
                &asset_name,
            )
            .await?;
        tracing::info!(
            job_key = key,
            bytes = character_bytes.len(),
            "Character image generated",
        );

        let keyword_image = self
            .cache
            .store(key, ImageRole::Keyword, &keyword_bytes)
            .await?;
        let character_image = self
            .cache
            .store(key, ImageRole::Character, &character_bytes)
            .await?;

        Ok(GeneratedImages {
            keyword_image,
            character_image,
        })
    }
}
