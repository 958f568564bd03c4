//! Route definitions for the `/jobs` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs` that answer without waiting on a run.
///
/// ```text
/// POST   /{key}/start          -> start_job
/// GET    /{key}/status         -> job_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{key}/start", post(jobs::start_job))
        .route("/{key}/status", get(jobs::job_status))
}

/// Routes mounted at `/jobs` that hold the request for a whole run.
///
/// ```text
/// POST   /{key}/start-sync     -> start_job_sync
/// ```
pub fn inline_router() -> Router<AppState> {
    Router::new().route("/{key}/start-sync", post(jobs::start_job_sync))
}
