use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Jobs currently waiting for or holding a worker.
    pub jobs: JobLoad,
}

#[derive(Serialize)]
pub struct JobLoad {
    pub pending: usize,
    pub running: usize,
}

/// GET /health -- returns service status and job load.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let counts = state.jobs.counts().await;

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        jobs: JobLoad {
            pending: counts.pending,
            running: counts.running,
        },
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
