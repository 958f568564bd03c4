//! The generation workflow state machine.
//!
//! Step sequence, with the progress checkpoint reported before each step:
//!
//! 1. `RUNNING` / preparing (tracked path only)
//! 2. load the analysis context, fail fast on missing or blank inputs
//! 3. resolve the base character asset
//! 4. normalize size and derive `use_cache = !regenerate`
//! 5. keyword illustration (reported by the generator)
//! 6. character illustration (reported by the generator)
//! 7. persist both references
//! 8. `DONE` (tracked path only)
//!
//! [`GenerationWorkflow::execute`] runs steps 2 to 7 against any
//! [`ProgressSink`]. [`GenerationWorkflow::run_tracked`] wraps it with the
//! job state store and converts every failure into a terminal `ERROR`
//! record; [`GenerationWorkflow::run_sync`] uses a no-op sink and returns
//! the error to the caller instead.

use std::sync::Arc;

use inkwell_core::context::JobContext;
use inkwell_core::error::CoreError;
use inkwell_core::generation::{
    GenerationRequest, GenerationResult, ImageGenerator, ImageSize,
};
use inkwell_core::job::checkpoint;
use inkwell_core::job_store::JobStateStore;
use inkwell_core::progress::{JobProgress, NoopProgress, ProgressSink};
use inkwell_core::types::JobKey;

use crate::collaborators::{AssetResolver, ContextResolver, ResultSink};
use crate::error::PipelineError;

/// Caller-supplied options of a submission.
#[derive(Debug, Clone, Default)]
pub struct JobParams {
    /// Ignore cached artifacts and call the provider again.
    pub regenerate: bool,
    /// Requested size (`"1024"` or `"1536x1024"`); default when `None`.
    pub size: Option<String>,
}

/// Runs the illustration pipeline for one job key at a time.
pub struct GenerationWorkflow {
    contexts: Arc<dyn ContextResolver>,
    assets: Arc<dyn AssetResolver>,
    generator: Arc<dyn ImageGenerator>,
    results: Arc<dyn ResultSink>,
    default_size: String,
}

impl GenerationWorkflow {
    pub fn new(
        contexts: Arc<dyn ContextResolver>,
        assets: Arc<dyn AssetResolver>,
        generator: Arc<dyn ImageGenerator>,
        results: Arc<dyn ResultSink>,
        default_size: impl Into<String>,
    ) -> Self {
        Self {
            contexts,
            assets,
            generator,
            results,
            default_size: default_size.into(),
        }
    }

    /// Normalize a requested size against the configured default.
    ///
    /// Lets callers reject a bad size before any job is queued.
    pub fn resolve_size(&self, raw: Option<&str>) -> Result<ImageSize, CoreError> {
        ImageSize::normalize(raw, &self.default_size)
    }

    /// Run the pipeline and record every step in `store`.
    ///
    /// Never fails: any error ends the job in `ERROR` with the message
    /// `"error: <cause>"` and its [`ErrorKind`](inkwell_core::job::ErrorKind).
    pub async fn run_tracked(&self, key: JobKey, params: &JobParams, store: &Arc<JobStateStore>) {
        store.start(key, "preparing").await;
        let progress = JobProgress::new(Arc::clone(store), key);
        progress.report(checkpoint::PREPARING, "preparing").await;

        match self.execute(key, params, &progress).await {
            Ok(result) => {
                tracing::info!(
                    job_key = key,
                    analysis_id = result.analysis_id,
                    "Generation job completed",
                );
                store.done(key, "complete").await;
            }
            Err(e) => {
                let kind = e.kind();
                tracing::error!(job_key = key, kind = %kind, error = %e, "Generation job failed");
                store.error(key, &format!("error: {e}"), kind).await;
            }
        }
    }

    /// Run the pipeline inline without touching the job state store.
    pub async fn run_sync(
        &self,
        key: JobKey,
        params: &JobParams,
    ) -> Result<GenerationResult, PipelineError> {
        self.execute(key, params, &NoopProgress).await
    }

    /// Steps 2 to 7 of the workflow, shared by both entry points.
    pub async fn execute(
        &self,
        key: JobKey,
        params: &JobParams,
        progress: &dyn ProgressSink,
    ) -> Result<GenerationResult, PipelineError> {
        progress
            .report(checkpoint::CONTEXT, "loading diary analysis")
            .await;
        let context = self
            .contexts
            .resolve(key)
            .await
            .map_err(PipelineError::ContextLookup)?
            .ok_or(PipelineError::MissingContext(key))?;
        validate_context(&context)?;

        progress
            .report(checkpoint::ASSET, "resolving character asset")
            .await;
        let base_asset = self.assets.resolve(&context.subject_type).await?;

        progress
            .report(checkpoint::PARAMETERS, "preparing generation request")
            .await;
        let size = self
            .resolve_size(params.size.as_deref())
            .map_err(|e| match e {
                CoreError::Validation(msg) => PipelineError::InvalidParameters(msg),
                other => PipelineError::InvalidParameters(other.to_string()),
            })?;
        let request = GenerationRequest {
            job_key: key,
            keywords: context.keywords.trim().to_string(),
            subject_type: context.subject_type.trim().to_string(),
            base_asset,
            use_cache: !params.regenerate,
            size,
        };
        tracing::debug!(
            job_key = key,
            size = %size,
            use_cache = request.use_cache,
            asset = %request.base_asset.display(),
            "Generation request prepared",
        );

        let images = self.generator.generate(&request, progress).await?;

        progress.report(checkpoint::PERSIST, "saving images").await;
        let result = GenerationResult {
            keyword_image: images.keyword_image,
            character_image: images.character_image,
            analysis_id: context.analysis_id,
            user_id: context.user_id,
        };
        self.results
            .save(&result)
            .await
            .map_err(PipelineError::Persist)?;

        Ok(result)
    }
}

/// Cheap validation before any expensive call.
fn validate_context(context: &JobContext) -> Result<(), PipelineError> {
    if context.keywords.trim().is_empty() {
        return Err(PipelineError::BlankInput("keywords"));
    }
    if context.subject_type.trim().is_empty() {
        return Err(PipelineError::BlankInput("character type"));
    }
    Ok(())
}
