//! In-memory job state store.
//!
//! Maps a [`JobKey`] to its mutable [`JobRecord`]. One worker writes a given
//! key at a time; any number of status pollers read concurrently. The store
//! is constructed explicitly and shared behind an `Arc`, never as a global.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::job::{clamp_progress, ErrorKind, JobRecord, JobStatus, MAX_PROGRESS};
use crate::types::JobKey;

/// Per-status record counts, reported by the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub pending: usize,
    pub running: usize,
    pub done: usize,
    pub error: usize,
}

/// Thread-safe registry of job progress records.
///
/// Terminal records are sticky: [`update`](Self::update) on a `DONE` or
/// `ERROR` record is ignored. Only [`enqueue`](Self::enqueue) and
/// [`start`](Self::start) re-open a key.
pub struct JobStateStore {
    records: RwLock<HashMap<JobKey, JobRecord>>,
}

impl JobStateStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Register a submission as `PENDING`.
    ///
    /// Rejects the key with [`CoreError::Conflict`] while a previous run is
    /// still queued or running. A key in a terminal state is reset.
    pub async fn enqueue(&self, key: JobKey, message: &str) -> Result<(), CoreError> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&key) {
            if existing.status.is_in_flight() {
                return Err(CoreError::Conflict(format!(
                    "Job {key} is already {}",
                    existing.status
                )));
            }
        }
        records.insert(key, JobRecord::new(JobStatus::Pending, message));
        Ok(())
    }

    /// Mark a job as `RUNNING` with progress reset to zero, creating the
    /// record if absent.
    pub async fn start(&self, key: JobKey, message: &str) {
        self.records
            .write()
            .await
            .insert(key, JobRecord::new(JobStatus::Running, message));
    }

    /// Record a progress step.
    ///
    /// Progress is clamped into `0..=100` and never moves backwards. An empty
    /// `message` keeps the previous one. Creates a `RUNNING` record if the key
    /// has never been seen.
    pub async fn update(&self, key: JobKey, progress: i32, message: &str) {
        let mut records = self.records.write().await;
        let record = records
            .entry(key)
            .or_insert_with(|| JobRecord::new(JobStatus::Running, message));

        if record.status.is_terminal() {
            tracing::debug!(
                job_key = key,
                status = %record.status,
                "Ignoring progress update on terminal job",
            );
            return;
        }

        record.status = JobStatus::Running;
        record.progress = record.progress.max(clamp_progress(progress));
        if !message.is_empty() {
            record.message = message.to_string();
        }
        record.updated_at = chrono::Utc::now();
    }

    /// Mark a job as `DONE` with progress forced to 100.
    pub async fn done(&self, key: JobKey, message: &str) {
        let mut records = self.records.write().await;
        let record = records
            .entry(key)
            .or_insert_with(|| JobRecord::new(JobStatus::Done, message));
        record.status = JobStatus::Done;
        record.progress = MAX_PROGRESS;
        record.message = message.to_string();
        record.error_kind = None;
        record.updated_at = chrono::Utc::now();
    }

    /// Mark a job as `ERROR`, keeping the last recorded progress so the
    /// client can see how far it got.
    pub async fn error(&self, key: JobKey, message: &str, kind: ErrorKind) {
        let mut records = self.records.write().await;
        let record = records
            .entry(key)
            .or_insert_with(|| JobRecord::new(JobStatus::Error, message));
        record.status = JobStatus::Error;
        record.message = message.to_string();
        record.error_kind = Some(kind);
        record.updated_at = chrono::Utc::now();
    }

    /// Current snapshot of a job, or `None` if the key was never submitted
    /// (or has been evicted).
    pub async fn get(&self, key: JobKey) -> Option<JobRecord> {
        self.records.read().await.get(&key).cloned()
    }

    /// Remove terminal records whose last mutation is older than `ttl`.
    ///
    /// Queued and running records are never evicted. Returns the number of
    /// records removed.
    pub async fn evict_expired(&self, ttl: Duration) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return 0;
        };
        let Some(cutoff) = chrono::Utc::now().checked_sub_signed(ttl) else {
            return 0;
        };

        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !(r.status.is_terminal() && r.updated_at <= cutoff));
        before - records.len()
    }

    /// Count records by status.
    pub async fn counts(&self) -> JobCounts {
        let records = self.records.read().await;
        let mut counts = JobCounts::default();
        for record in records.values() {
            match record.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    /// Total number of tracked records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for JobStateStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
