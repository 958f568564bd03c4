//! Periodic eviction of finished job records.
//!
//! Terminal (`DONE` / `ERROR`) records older than the configured TTL are
//! dropped from the in-memory store so it does not grow for the lifetime of
//! the process. Queued and running records are never touched.

use std::sync::Arc;
use std::time::Duration;

use inkwell_core::job_store::JobStateStore;
use tokio_util::sync::CancellationToken;

/// Run the eviction loop until `cancel` is triggered.
pub async fn run(
    store: Arc<JobStateStore>,
    ttl: Duration,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        ttl_secs = ttl.as_secs(),
        interval_secs = every.as_secs(),
        "Job eviction sweeper started"
    );

    let mut interval = tokio::time::interval(every);
    // The first tick fires immediately and there is nothing to evict yet.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job eviction sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = store.evict_expired(ttl).await;
                if evicted > 0 {
                    let remaining = store.len().await;
                    tracing::info!(evicted, remaining, "Evicted expired job records");
                } else {
                    tracing::debug!("Job eviction: nothing to evict");
                }
            }
        }
    }
}
