//! Job lifecycle types: status, error kind, progress record and the
//! progress checkpoints the polling client renders.

use serde::Serialize;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Progress checkpoints
// ---------------------------------------------------------------------------

/// Progress percentages emitted by the generation workflow.
///
/// The polling UI maps these to a progress bar, so the values are part of
/// the status protocol and must stay in this order.
pub mod checkpoint {
    /// Worker picked the job up.
    pub const PREPARING: u8 = 5;
    /// Loading the analysis context for the entry.
    pub const CONTEXT: u8 = 10;
    /// Base character asset resolved.
    pub const ASSET: u8 = 10;
    /// Size and cache flag normalized.
    pub const PARAMETERS: u8 = 20;
    /// Generating the keyword illustration.
    pub const KEYWORD_IMAGE: u8 = 40;
    /// Generating the character illustration.
    pub const CHARACTER_IMAGE: u8 = 70;
    /// Saving the artifact references.
    pub const PERSIST: u8 = 90;
    /// Terminal success.
    pub const DONE: u8 = 100;
}

/// Upper bound of the progress scale.
pub const MAX_PROGRESS: u8 = 100;

/// Clamp an arbitrary progress value into `0..=100`.
pub fn clamp_progress(progress: i32) -> u8 {
    progress.clamp(0, MAX_PROGRESS as i32) as u8
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Execution status of a job.
///
/// `Pending -> Running -> {Done | Error}`. `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl JobStatus {
    /// Whether no further transitions happen without a new submission.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    /// Whether a run for this key is queued or executing.
    pub fn is_in_flight(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Done => "DONE",
            JobStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Error kind
// ---------------------------------------------------------------------------

/// Machine-readable failure category attached to `ERROR` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Missing or blank inputs detected before any external call.
    Precondition,
    /// The generation provider failed or answered with an unusable payload.
    External,
    /// Local filesystem or storage failure.
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Precondition => "precondition",
            ErrorKind::External => "external",
            ErrorKind::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Snapshot of one job's progress, as seen by a status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub status: JobStatus,
    /// `0..=100`, non-decreasing while running, exactly 100 once done.
    pub progress: u8,
    /// Human-readable description of the current step.
    pub message: String,
    /// Failure category, set only when `status` is `Error`.
    pub error_kind: Option<ErrorKind>,
    /// Time of the last mutation.
    pub updated_at: Timestamp,
}

impl JobRecord {
    pub(crate) fn new(status: JobStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            progress: 0,
            message: message.into(),
            error_kind: None,
            updated_at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
