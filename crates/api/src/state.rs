use std::sync::Arc;

use inkwell_core::job_store::JobStateStore;
use inkwell_pipeline::GenerationWorkflow;

use crate::engine::dispatcher::JobDispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Progress records read by the status endpoint.
    pub jobs: Arc<JobStateStore>,
    /// Submission handle of the background worker pool.
    pub dispatcher: JobDispatcher,
    /// Workflow used inline by `start-sync`.
    pub workflow: Arc<GenerationWorkflow>,
}
