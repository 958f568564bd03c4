//! Bounded worker pool for tracked generation jobs.
//!
//! Submissions go through a bounded channel. A fixed number of worker tasks
//! share the receiving end and run [`GenerationWorkflow::run_tracked`] for
//! each dequeued job, so the number of concurrent provider calls never
//! exceeds the worker count. Callers of [`JobDispatcher::submit`] never wait
//! on the workflow itself.
//!
//! Inline (`start-sync`) runs do not go through the queue, but they claim
//! their key here so a key never runs on both paths at once.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use inkwell_core::error::CoreError;
use inkwell_core::job::ErrorKind;
use inkwell_core::job_store::JobStateStore;
use inkwell_core::types::JobKey;
use inkwell_pipeline::{GenerationWorkflow, JobParams};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::JobPoolConfig;

/// One queued submission.
#[derive(Debug)]
struct QueuedJob {
    key: JobKey,
    params: JobParams,
}

/// Cloneable submission handle.
#[derive(Clone)]
pub struct JobDispatcher {
    sender: mpsc::Sender<QueuedJob>,
    store: Arc<JobStateStore>,
    inline_runs: Arc<std::sync::Mutex<HashSet<JobKey>>>,
}

/// Exclusive hold on a key for one inline run. Released on drop, including
/// when the request future is cancelled.
pub struct InlineClaim {
    key: JobKey,
    inline_runs: Arc<std::sync::Mutex<HashSet<JobKey>>>,
}

impl Drop for InlineClaim {
    fn drop(&mut self) {
        self.inline_runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Owns the worker tasks; used once at shutdown.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl JobDispatcher {
    /// Spawn `config.workers` workers and return the submission handle
    /// together with the pool that owns them.
    pub fn start(
        workflow: Arc<GenerationWorkflow>,
        store: Arc<JobStateStore>,
        config: &JobPoolConfig,
    ) -> (Self, WorkerPool) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let cancel = CancellationToken::new();

        let handles = (0..config.workers)
            .map(|worker| {
                tokio::spawn(worker_loop(
                    worker,
                    Arc::clone(&receiver),
                    Arc::clone(&workflow),
                    Arc::clone(&store),
                    cancel.clone(),
                ))
            })
            .collect();

        tracing::info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "Job worker pool started",
        );

        let dispatcher = Self {
            sender,
            store,
            inline_runs: Arc::default(),
        };
        (dispatcher, WorkerPool { handles, cancel })
    }

    /// Register `key` as `PENDING` and queue it for a worker.
    ///
    /// Fails with [`CoreError::Conflict`] while the key is still queued or
    /// running, and with [`CoreError::Unavailable`] when the queue is full or
    /// closed. In the latter case the record is left in `ERROR` so pollers
    /// see why the job never ran.
    pub async fn submit(&self, key: JobKey, params: JobParams) -> Result<(), CoreError> {
        self.store.enqueue(key, "queued").await?;

        // Checked after enqueue; `claim_inline` checks in the opposite order.
        if self.is_running_inline(key) {
            tracing::warn!(job_key = key, "Job rejected: inline run in progress");
            self.store
                .error(
                    key,
                    "error: a synchronous run is in progress",
                    ErrorKind::Precondition,
                )
                .await;
            return Err(CoreError::Conflict(format!(
                "Job {key} is already running synchronously"
            )));
        }

        let reason = match self.sender.try_send(QueuedJob { key, params }) {
            Ok(()) => {
                tracing::info!(job_key = key, "Job queued");
                return Ok(());
            }
            Err(mpsc::error::TrySendError::Full(_)) => "job queue is full",
            Err(mpsc::error::TrySendError::Closed(_)) => "job queue is closed",
        };

        tracing::warn!(job_key = key, reason, "Job rejected");
        self.store
            .error(key, &format!("error: {reason}"), ErrorKind::External)
            .await;
        Err(CoreError::Unavailable(reason.to_string()))
    }

    /// Reserve `key` for an inline run.
    ///
    /// Fails with [`CoreError::Conflict`] while another inline run holds the
    /// key or a tracked run has it queued or running.
    pub async fn claim_inline(&self, key: JobKey) -> Result<InlineClaim, CoreError> {
        let claimed = self.lock_inline_runs().insert(key);
        if !claimed {
            return Err(CoreError::Conflict(format!(
                "Job {key} is already running synchronously"
            )));
        }
        let claim = InlineClaim {
            key,
            inline_runs: Arc::clone(&self.inline_runs),
        };

        if let Some(record) = self.store.get(key).await {
            if record.status.is_in_flight() {
                return Err(CoreError::Conflict(format!(
                    "Job {key} is already {}",
                    record.status
                )));
            }
        }

        Ok(claim)
    }

    fn is_running_inline(&self, key: JobKey) -> bool {
        self.lock_inline_runs().contains(&key)
    }

    fn lock_inline_runs(&self) -> std::sync::MutexGuard<'_, HashSet<JobKey>> {
        self.inline_runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkerPool {
    /// Stop taking new work and wait for queued and running jobs to finish.
    ///
    /// Jobs still running after `timeout` are abandoned with their records
    /// left as they are.
    pub async fn shutdown(self, timeout: Duration) {
        self.cancel.cancel();
        let pending = self.handles.len();

        match tokio::time::timeout(timeout, futures::future::join_all(self.handles)).await {
            Ok(results) => {
                let panicked = results.iter().filter(|r| r.is_err()).count();
                if panicked > 0 {
                    tracing::error!(panicked, "Job workers exited abnormally");
                }
                tracing::info!(workers = pending, "Job worker pool drained");
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Job worker pool did not drain in time",
                );
            }
        }
    }
}

/// Pull jobs until the queue is closed and empty.
async fn worker_loop(
    worker: usize,
    receiver: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    workflow: Arc<GenerationWorkflow>,
    store: Arc<JobStateStore>,
    cancel: CancellationToken,
) {
    tracing::debug!(worker, "Job worker started");

    loop {
        // The lock is held only while waiting for the next job.
        let next = {
            let mut rx = receiver.lock().await;
            let received = tokio::select! {
                job = rx.recv() => Some(job),
                _ = cancel.cancelled() => None,
            };
            match received {
                Some(job) => job,
                None => {
                    // Closing keeps buffered jobs receivable.
                    rx.close();
                    rx.recv().await
                }
            }
        };

        let Some(job) = next else {
            break;
        };

        let key = job.key;
        tracing::info!(worker, job_key = key, regenerate = job.params.regenerate, "Job dispatched");

        // Each run gets its own task so a panic ends the job, not the worker.
        let run = {
            let workflow = Arc::clone(&workflow);
            let store = Arc::clone(&store);
            tokio::spawn(async move { workflow.run_tracked(job.key, &job.params, &store).await })
        };
        if let Err(e) = run.await {
            tracing::error!(worker, job_key = key, error = %e, "Job run panicked");
            store
                .error(key, "error: worker panicked", ErrorKind::Io)
                .await;
        }
    }

    tracing::debug!(worker, "Job worker stopped");
}
