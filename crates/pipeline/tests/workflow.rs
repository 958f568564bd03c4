//! Workflow tests with in-memory collaborators and a counting generator.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use inkwell_core::context::JobContext;
use inkwell_core::error::CoreError;
use inkwell_core::generation::{
    GeneratedImages, GenerationError, GenerationRequest, GenerationResult, ImageGenerator,
};
use inkwell_core::job::{checkpoint, ErrorKind, JobStatus};
use inkwell_core::job_store::JobStateStore;
use inkwell_core::progress::ProgressSink;
use inkwell_core::types::JobKey;
use inkwell_pipeline::assets::FsAssetResolver;
use inkwell_pipeline::collaborators::{BoxError, ContextResolver, ResultSink};
use inkwell_pipeline::{GenerationWorkflow, JobParams, PipelineError};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StaticContexts {
    contexts: HashMap<JobKey, JobContext>,
}

impl StaticContexts {
    fn with(mut self, key: JobKey, keywords: &str, subject: &str) -> Self {
        self.contexts.insert(
            key,
            JobContext {
                keywords: keywords.into(),
                subject_type: subject.into(),
                analysis_id: key * 10,
                user_id: 7,
            },
        );
        self
    }
}

#[async_trait::async_trait]
impl ContextResolver for StaticContexts {
    async fn resolve(&self, key: JobKey) -> Result<Option<JobContext>, BoxError> {
        Ok(self.contexts.get(&key).cloned())
    }
}

/// Mimics the artifact cache: keys generated once are served from the
/// "cache" afterwards unless caching is disabled.
#[derive(Default)]
struct CountingGenerator {
    calls: AtomicUsize,
    cached: Mutex<HashSet<JobKey>>,
    fail_with: Option<u16>,
}

impl CountingGenerator {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageGenerator for CountingGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<GeneratedImages, GenerationError> {
        let key = request.job_key;
        let images = GeneratedImages {
            keyword_image: format!("/media/diary/{key}_keyword.png"),
            character_image: format!("/media/diary/{key}_character.png"),
        };

        if request.use_cache && self.cached.lock().unwrap().contains(&key) {
            return Ok(images);
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        progress.report(checkpoint::KEYWORD_IMAGE, "keyword").await;
        if let Some(status) = self.fail_with {
            return Err(GenerationError::Provider {
                status,
                body: "provider down".into(),
            });
        }
        progress.report(checkpoint::CHARACTER_IMAGE, "character").await;

        self.cached.lock().unwrap().insert(key);
        Ok(images)
    }
}

#[derive(Default)]
struct RecordingSink {
    saved: Mutex<Vec<GenerationResult>>,
    fail: bool,
}

#[async_trait::async_trait]
impl ResultSink for RecordingSink {
    async fn save(&self, result: &GenerationResult) -> Result<(), BoxError> {
        if self.fail {
            return Err("database unavailable".into());
        }
        self.saved.lock().unwrap().push(result.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingProgress {
    steps: Mutex<Vec<u8>>,
}

#[async_trait::async_trait]
impl ProgressSink for RecordingProgress {
    async fn report(&self, progress: u8, _message: &str) {
        self.steps.lock().unwrap().push(progress);
    }
}

struct Harness {
    _assets: TempDir,
    generator: Arc<CountingGenerator>,
    sink: Arc<RecordingSink>,
    store: Arc<JobStateStore>,
    workflow: GenerationWorkflow,
}

fn harness(contexts: StaticContexts) -> Harness {
    harness_with(contexts, CountingGenerator::default(), RecordingSink::default())
}

fn harness_with(
    contexts: StaticContexts,
    generator: CountingGenerator,
    sink: RecordingSink,
) -> Harness {
    let assets = TempDir::new().unwrap();
    std::fs::write(assets.path().join("fox.png"), b"fox").unwrap();

    let generator = Arc::new(generator);
    let sink = Arc::new(sink);
    let workflow = GenerationWorkflow::new(
        Arc::new(contexts),
        Arc::new(FsAssetResolver::new(assets.path())),
        generator.clone(),
        sink.clone(),
        "1024",
    );

    Harness {
        _assets: assets,
        generator,
        sink,
        store: Arc::new(JobStateStore::new()),
        workflow,
    }
}

fn cached() -> JobParams {
    JobParams::default()
}

fn regenerate() -> JobParams {
    JobParams {
        regenerate: true,
        size: None,
    }
}

// ---------------------------------------------------------------------------
// Test: happy path ends DONE at 100 with one persisted result
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tracked_run_completes_and_persists_once() {
    let h = harness(StaticContexts::default().with(42, "picnic", "fox"));

    h.workflow.run_tracked(42, &cached(), &h.store).await;

    let record = h.store.get(42).await.unwrap();
    assert_eq!(record.status, JobStatus::Done);
    assert_eq!(record.progress, 100);
    assert_eq!(h.generator.calls(), 1);

    let saved = h.sink.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_ne!(saved[0].keyword_image, saved[0].character_image);
    assert_eq!(saved[0].analysis_id, 420);
    assert_eq!(saved[0].user_id, 7);
}

// ---------------------------------------------------------------------------
// Test: missing context fails before the generator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_context_errors_without_generation() {
    let h = harness(StaticContexts::default());

    h.workflow.run_tracked(43, &cached(), &h.store).await;

    let record = h.store.get(43).await.unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert!(record.message.starts_with("error: "));
    assert!(record.message.contains("prerequisite analysis missing"));
    assert_eq!(record.error_kind, Some(ErrorKind::Precondition));
    assert_eq!(h.generator.calls(), 0);
    assert!(h.sink.saved.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: a second cached run does not call the provider again
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cached_rerun_skips_generation() {
    let h = harness(StaticContexts::default().with(44, "picnic", "fox"));

    h.workflow.run_tracked(44, &cached(), &h.store).await;
    h.workflow.run_tracked(44, &cached(), &h.store).await;

    let record = h.store.get(44).await.unwrap();
    assert_eq!(record.status, JobStatus::Done);
    assert_eq!(record.progress, 100);
    assert_eq!(h.generator.calls(), 1);
    assert_eq!(h.sink.saved.lock().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Test: regenerate always calls the provider
// ---------------------------------------------------------------------------

#[tokio::test]
async fn regenerate_bypasses_cache() {
    let h = harness(StaticContexts::default().with(44, "picnic", "fox"));

    h.workflow.run_tracked(44, &cached(), &h.store).await;
    h.workflow.run_tracked(44, &regenerate(), &h.store).await;

    assert_eq!(h.generator.calls(), 2);
}

// ---------------------------------------------------------------------------
// Test: precondition failures never reach the generator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_keywords_fail_fast() {
    let h = harness(StaticContexts::default().with(1, "   ", "fox"));

    let err = h.workflow.run_sync(1, &cached()).await.unwrap_err();

    assert_matches!(err, PipelineError::BlankInput("keywords"));
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn blank_subject_fails_fast() {
    let h = harness(StaticContexts::default().with(1, "picnic", ""));

    let err = h.workflow.run_sync(1, &cached()).await.unwrap_err();

    assert_matches!(err, PipelineError::BlankInput("character type"));
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn missing_asset_fails_fast() {
    let h = harness(StaticContexts::default().with(2, "picnic", "owl"));

    h.workflow.run_tracked(2, &cached(), &h.store).await;

    let record = h.store.get(2).await.unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert!(record.message.contains("owl"));
    assert_eq!(record.progress, checkpoint::ASSET);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn invalid_size_fails_fast() {
    let h = harness(StaticContexts::default().with(3, "picnic", "fox"));
    let params = JobParams {
        regenerate: false,
        size: Some("enormous".into()),
    };

    let err = h.workflow.run_sync(3, &params).await.unwrap_err();

    assert_matches!(err, PipelineError::InvalidParameters(_));
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(h.generator.calls(), 0);
}

#[test]
fn resolve_size_applies_the_default() {
    let h = harness(StaticContexts::default());

    assert_eq!(h.workflow.resolve_size(None).unwrap().to_string(), "1024x1024");
    assert_eq!(h.workflow.resolve_size(Some("512")).unwrap().to_string(), "512x512");
    assert_matches!(
        h.workflow.resolve_size(Some("enormous")),
        Err(CoreError::Validation(_))
    );
}

// ---------------------------------------------------------------------------
// Test: provider failure keeps the last reached progress
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_failure_records_external_error() {
    let generator = CountingGenerator {
        fail_with: Some(503),
        ..Default::default()
    };
    let h = harness_with(
        StaticContexts::default().with(5, "picnic", "fox"),
        generator,
        RecordingSink::default(),
    );

    h.workflow.run_tracked(5, &cached(), &h.store).await;

    let record = h.store.get(5).await.unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert_eq!(record.progress, checkpoint::KEYWORD_IMAGE);
    assert_eq!(record.error_kind, Some(ErrorKind::External));
    assert!(record.message.contains("503"));
    assert!(h.sink.saved.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: persistence failure is an I/O error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn persistence_failure_records_io_error() {
    let sink = RecordingSink {
        fail: true,
        ..Default::default()
    };
    let h = harness_with(
        StaticContexts::default().with(6, "picnic", "fox"),
        CountingGenerator::default(),
        sink,
    );

    h.workflow.run_tracked(6, &cached(), &h.store).await;

    let record = h.store.get(6).await.unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert_eq!(record.progress, checkpoint::PERSIST);
    assert_eq!(record.error_kind, Some(ErrorKind::Io));
}

// ---------------------------------------------------------------------------
// Test: reported progress never decreases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn progress_is_non_decreasing() {
    let h = harness(StaticContexts::default().with(8, "picnic", "fox"));
    let progress = RecordingProgress::default();

    h.workflow.execute(8, &regenerate(), &progress).await.unwrap();

    let steps = progress.steps.lock().unwrap();
    assert_eq!(
        *steps,
        vec![
            checkpoint::CONTEXT,
            checkpoint::ASSET,
            checkpoint::PARAMETERS,
            checkpoint::KEYWORD_IMAGE,
            checkpoint::CHARACTER_IMAGE,
            checkpoint::PERSIST,
        ]
    );
    assert!(steps.windows(2).all(|w| w[0] <= w[1]));
}

// ---------------------------------------------------------------------------
// Test: sync and tracked paths produce the same references
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sync_and_tracked_runs_agree() {
    let h = harness(StaticContexts::default().with(42, "picnic", "fox"));

    let sync_result = h.workflow.run_sync(42, &regenerate()).await.unwrap();
    h.workflow.run_tracked(42, &regenerate(), &h.store).await;

    let saved = h.sink.saved.lock().unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0], sync_result);
    assert_eq!(saved[1], sync_result);
}

#[tokio::test]
async fn sync_run_does_not_touch_store() {
    let h = harness(StaticContexts::default().with(42, "picnic", "fox"));

    h.workflow.run_sync(42, &cached()).await.unwrap();

    assert!(h.store.get(42).await.is_none());
}
