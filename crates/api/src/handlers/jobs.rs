//! Handlers for the `/jobs/{key}` control surface.
//!
//! `start` hands the job to the worker pool and returns immediately,
//! `status` reads the in-memory progress record, and `start-sync` runs the
//! same workflow inline for operational use.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use inkwell_core::error::CoreError;
use inkwell_core::types::JobKey;
use inkwell_pipeline::JobParams;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Query parameters shared by `start` and `start-sync`.
#[derive(Debug, Default, Deserialize)]
pub struct StartQuery {
    /// Ignore cached artifacts.
    #[serde(default)]
    pub regenerate: bool,
    /// `"1024"` or `"WxH"`. Blank or absent uses the configured default.
    pub size: Option<String>,
}

impl From<StartQuery> for JobParams {
    fn from(query: StartQuery) -> Self {
        JobParams {
            regenerate: query.regenerate,
            size: query.size,
        }
    }
}

/// Body of a successful `start-sync` call.
#[derive(Debug, Serialize)]
pub struct SyncResultResponse {
    /// Keyword illustration reference.
    #[serde(rename = "resultA")]
    pub result_a: String,
    /// Character illustration reference.
    #[serde(rename = "resultB")]
    pub result_b: String,
}

// ---------------------------------------------------------------------------
// Start (async)
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{key}/start
///
/// Queue a tracked run and return 202 without waiting for it. Returns 400
/// for a malformed size, 409 while the key is already queued or running
/// (on either path), 503 when the queue is full.
pub async fn start_job(
    State(state): State<AppState>,
    Path(key): Path<JobKey>,
    Query(query): Query<StartQuery>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(
        job_key = key,
        regenerate = query.regenerate,
        size = query.size.as_deref().unwrap_or(""),
        "Job submitted",
    );

    state.workflow.resolve_size(query.size.as_deref())?;
    state.dispatcher.submit(key, query.into()).await?;
    Ok(StatusCode::ACCEPTED)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{key}/status
///
/// Current progress record. 404 for keys never submitted (or already
/// evicted); such keys never get a default record.
pub async fn job_status(
    State(state): State<AppState>,
    Path(key): Path<JobKey>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .jobs
        .get(key)
        .await
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: key,
        }))?;

    Ok(Json(record))
}

// ---------------------------------------------------------------------------
// Start (sync)
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{key}/start-sync
///
/// Run the workflow inline and return both artifact references. Does not
/// create or touch a progress record, but answers 409 while the same key is
/// queued or running. Failures answer 500 with the error message and its
/// kind.
pub async fn start_job_sync(
    State(state): State<AppState>,
    Path(key): Path<JobKey>,
    Query(query): Query<StartQuery>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(job_key = key, regenerate = query.regenerate, "Synchronous run requested");

    state.workflow.resolve_size(query.size.as_deref())?;
    let _claim = state.dispatcher.claim_inline(key).await?;
    let result = state.workflow.run_sync(key, &query.into()).await?;

    Ok(Json(SyncResultResponse {
        result_a: result.keyword_image,
        result_b: result.character_image,
    }))
}
