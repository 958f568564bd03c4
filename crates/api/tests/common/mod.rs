//! Shared harness for HTTP-level tests.
//!
//! Builds the production router around a real workflow: the filesystem
//! asset resolver and artifact cache live in a temp directory, the
//! generation client talks to a wiremock provider, and the database-backed
//! collaborators are replaced by in-memory doubles.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use http_body_util::BodyExt;
use inkwell_api::config::{JobPoolConfig, ServerConfig};
use inkwell_api::engine::dispatcher::{JobDispatcher, WorkerPool};
use inkwell_api::router::build_app_router;
use inkwell_api::state::AppState;
use inkwell_core::context::JobContext;
use inkwell_core::generation::GenerationResult;
use inkwell_core::job_store::JobStateStore;
use inkwell_core::types::JobKey;
use inkwell_imagegen::api::ImageApi;
use inkwell_imagegen::cache::ArtifactCache;
use inkwell_imagegen::config::{ImageApiConfig, MediaConfig};
use inkwell_imagegen::GenerationClient;
use inkwell_pipeline::assets::FsAssetResolver;
use inkwell_pipeline::collaborators::{BoxError, ContextResolver, ResultSink};
use inkwell_pipeline::GenerationWorkflow;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// PNG signature followed by the start of an IHDR chunk.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

/// Keys with an analysis. Key 43 deliberately has none.
pub const ANALYSED_KEYS: &[JobKey] = &[42, 44, 45, 46, 47];

/// Key whose analysis lookup panics.
pub const PANICKING_KEY: JobKey = 13;

// ---------------------------------------------------------------------------
// Collaborator doubles
// ---------------------------------------------------------------------------

pub struct StaticContexts {
    contexts: HashMap<JobKey, JobContext>,
}

#[async_trait::async_trait]
impl ContextResolver for StaticContexts {
    async fn resolve(&self, key: JobKey) -> Result<Option<JobContext>, BoxError> {
        if key == PANICKING_KEY {
            panic!("analysis lookup for {key} blew up");
        }
        Ok(self.contexts.get(&key).cloned())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub saved: Mutex<Vec<GenerationResult>>,
}

impl RecordingSink {
    pub fn saved(&self) -> Vec<GenerationResult> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ResultSink for RecordingSink {
    async fn save(&self, result: &GenerationResult) -> Result<(), BoxError> {
        self.saved.lock().unwrap().push(result.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test app
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub jobs: Arc<JobStateStore>,
    pub provider: MockServer,
    pub results: Arc<RecordingSink>,
    pub media_root: PathBuf,
    workers: Option<WorkerPool>,
    _dir: TempDir,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(media_root: PathBuf, jobs: JobPoolConfig) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        media: MediaConfig {
            root: media_root,
            url_prefix: "/media/diary".to_string(),
        },
        jobs,
    }
}

/// App with two workers and an instant provider.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(
        JobPoolConfig {
            workers: 2,
            queue_capacity: 8,
            ..JobPoolConfig::default()
        },
        Duration::ZERO,
    )
    .await
}

/// App with a custom pool and a provider that answers after `provider_delay`.
pub async fn spawn_app_with(jobs_config: JobPoolConfig, provider_delay: Duration) -> TestApp {
    spawn_app_with_timeout(jobs_config, provider_delay, 30).await
}

/// Like [`spawn_app_with`] with a custom request timeout.
pub async fn spawn_app_with_timeout(
    jobs_config: JobPoolConfig,
    provider_delay: Duration,
    request_timeout_secs: u64,
) -> TestApp {
    let dir = TempDir::new().unwrap();
    let asset_root = dir.path().join("assets");
    let media_root = dir.path().join("media");
    std::fs::create_dir_all(&asset_root).unwrap();
    std::fs::create_dir_all(&media_root).unwrap();
    std::fs::write(asset_root.join("fox.png"), PNG).unwrap();

    let provider = MockServer::start().await;
    for endpoint in ["/images/generations", "/images/edits"] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(inline_png().set_delay(provider_delay))
            .mount(&provider)
            .await;
    }

    let config = ServerConfig {
        request_timeout_secs,
        ..test_config(media_root.clone(), jobs_config)
    };
    let api = ImageApi::new(ImageApiConfig {
        base_url: provider.uri(),
        api_key: "test-key".into(),
        model: "test-model".into(),
        timeout: Duration::from_secs(10),
    })
    .unwrap();
    let generator = GenerationClient::new(api, ArtifactCache::new(&config.media));

    let contexts = StaticContexts {
        contexts: ANALYSED_KEYS
            .iter()
            .map(|&key| {
                (
                    key,
                    JobContext {
                        keywords: "picnic".into(),
                        subject_type: "fox".into(),
                        analysis_id: key * 10,
                        user_id: 7,
                    },
                )
            })
            .collect(),
    };
    let results = Arc::new(RecordingSink::default());

    let workflow = Arc::new(GenerationWorkflow::new(
        Arc::new(contexts),
        Arc::new(FsAssetResolver::new(asset_root)),
        Arc::new(generator),
        Arc::clone(&results) as Arc<dyn ResultSink>,
        "1024",
    ));

    let jobs = Arc::new(JobStateStore::new());
    let (dispatcher, workers) =
        JobDispatcher::start(Arc::clone(&workflow), Arc::clone(&jobs), &config.jobs);

    let state = AppState {
        jobs: Arc::clone(&jobs),
        dispatcher,
        workflow,
    };

    TestApp {
        router: build_app_router(state, &config),
        jobs,
        provider,
        results,
        media_root,
        workers: Some(workers),
        _dir: dir,
    }
}

fn inline_png() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "b64_json": BASE64.encode(PNG) }] }))
}

impl TestApp {
    /// Close the job queue and wait for the workers to drain it.
    pub async fn shutdown_workers(&mut self) {
        if let Some(workers) = self.workers.take() {
            workers.shutdown(Duration::from_secs(10)).await;
        }
    }

    /// Number of image requests the provider has received so far.
    pub async fn provider_calls(&self) -> usize {
        self.provider
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().starts_with("/images/"))
            .count()
    }

    pub async fn get(&self, uri: &str) -> Response {
        send(self.router.clone(), Method::GET, uri).await
    }

    pub async fn post(&self, uri: &str) -> Response {
        send(self.router.clone(), Method::POST, uri).await
    }

    /// Poll the status endpoint until the job reaches `DONE` or `ERROR`.
    pub async fn wait_for_terminal(&self, key: JobKey) -> Value {
        self.wait_for_status(key, &["DONE", "ERROR"]).await
    }

    /// Poll the status endpoint until the job reaches one of `statuses`.
    pub async fn wait_for_status(&self, key: JobKey, statuses: &[&str]) -> Value {
        let uri = format!("/api/v1/jobs/{key}/status");
        for _ in 0..500 {
            let response = self.get(&uri).await;
            if response.status() == StatusCode::OK {
                let json = body_json(response).await;
                if statuses.iter().any(|s| json["status"] == *s) {
                    return json;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job {key} never reached any of {statuses:?}");
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
