//! Progress reporting seam shared by the async and sync generation paths.

use std::sync::Arc;

use crate::job_store::JobStateStore;
use crate::types::JobKey;

/// Receives step-by-step progress from a generation run.
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    /// Report that the run reached `progress` percent while doing `message`.
    async fn report(&self, progress: u8, message: &str);
}

/// Discards all progress. Used by the synchronous entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait::async_trait]
impl ProgressSink for NoopProgress {
    async fn report(&self, _progress: u8, _message: &str) {}
}

/// Writes progress into the [`JobStateStore`] record of one job.
#[derive(Clone)]
pub struct JobProgress {
    store: Arc<JobStateStore>,
    key: JobKey,
}

impl JobProgress {
    pub fn new(store: Arc<JobStateStore>, key: JobKey) -> Self {
        Self { store, key }
    }
}

#[async_trait::async_trait]
impl ProgressSink for JobProgress {
    async fn report(&self, progress: u8, message: &str) {
        tracing::debug!(job_key = self.key, progress, message, "Job progress");
        self.store.update(self.key, progress.into(), message).await;
    }
}
