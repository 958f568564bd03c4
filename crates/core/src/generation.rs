//! Generation request types, size normalization and the generator seam.
//!
//! The workflow builds a [`GenerationRequest`] and hands it to an
//! [`ImageGenerator`]; the production implementation lives in
//! `inkwell-imagegen`, tests substitute counting doubles.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::CoreError;
use crate::job::ErrorKind;
use crate::progress::ProgressSink;
use crate::types::{DbId, JobKey};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Size used when the caller does not specify one.
pub const DEFAULT_IMAGE_SIZE: &str = "1024";

/// Smallest accepted edge length in pixels.
pub const MIN_IMAGE_EDGE: u32 = 64;

/// Largest accepted edge length in pixels.
pub const MAX_IMAGE_EDGE: u32 = 4096;

// ---------------------------------------------------------------------------
// Image roles
// ---------------------------------------------------------------------------

/// The two artifacts produced for every job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    /// Text-to-image illustration of the diary keywords.
    Keyword,
    /// Image-to-image edit of the user's character asset.
    Character,
}

impl ImageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageRole::Keyword => "keyword",
            ImageRole::Character => "character",
        }
    }

    /// Deterministic artifact file name for `key`. The job key is the cache
    /// key, so a re-run for the same entry lands on the same file.
    pub fn file_name(self, key: JobKey) -> String {
        format!("{key}_{}.png", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Image size
// ---------------------------------------------------------------------------

/// Requested output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// Normalize a caller-supplied size.
    ///
    /// - blank or missing: `default` is parsed instead
    /// - `"N"`: square `N x N`
    /// - `"WxH"`: kept as is
    ///
    /// Each edge must be in `MIN_IMAGE_EDGE..=MAX_IMAGE_EDGE`.
    pub fn normalize(raw: Option<&str>, default: &str) -> Result<Self, CoreError> {
        let raw = match raw.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => default.trim(),
        };

        let (w, h) = match raw.split_once(['x', 'X']) {
            Some((w, h)) => (w.trim(), h.trim()),
            None => (raw, raw),
        };

        let size = Self {
            width: parse_edge(w, raw)?,
            height: parse_edge(h, raw)?,
        };
        Ok(size)
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn parse_edge(edge: &str, raw: &str) -> Result<u32, CoreError> {
    let value: u32 = edge
        .parse()
        .map_err(|_| CoreError::Validation(format!("Invalid image size '{raw}'")))?;
    if !(MIN_IMAGE_EDGE..=MAX_IMAGE_EDGE).contains(&value) {
        return Err(CoreError::Validation(format!(
            "Image size '{raw}' out of range ({MIN_IMAGE_EDGE}..={MAX_IMAGE_EDGE})"
        )));
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// Everything the generator needs for one job.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub job_key: JobKey,
    /// Diary keywords embedded into both prompt templates.
    pub keywords: String,
    /// Character identifier, used in the edit prompt.
    pub subject_type: String,
    /// Base character image sent to the edit call.
    pub base_asset: PathBuf,
    /// Reuse artifacts already on disk for this key (`!regenerate`).
    pub use_cache: bool,
    pub size: ImageSize,
}

/// Public references to the two artifacts written by a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImages {
    pub keyword_image: String,
    pub character_image: String,
}

/// Outcome of a completed workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub keyword_image: String,
    pub character_image: String,
    pub analysis_id: DbId,
    pub user_id: DbId,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures raised by an [`ImageGenerator`]. Either call failing aborts the
/// whole generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The provider answered with a non-success status.
    #[error("image provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// The request never got a response (network, TLS, timeout).
    #[error("image provider request failed: {0}")]
    Transport(String),

    /// The provider answered, but not with a usable image.
    #[error("unusable image provider response: {0}")]
    InvalidResponse(String),

    /// Reading the base asset or writing an artifact failed.
    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Io(_) => ErrorKind::Io,
            _ => ErrorKind::External,
        }
    }
}

// ---------------------------------------------------------------------------
// Generator seam
// ---------------------------------------------------------------------------

/// Produces the keyword and character illustrations for a job.
///
/// Implementations report [`checkpoint::KEYWORD_IMAGE`] and
/// [`checkpoint::CHARACTER_IMAGE`] through `progress` before each provider
/// call, and skip both calls when `use_cache` is set and both artifacts for
/// the key already exist.
///
/// [`checkpoint::KEYWORD_IMAGE`]: crate::job::checkpoint::KEYWORD_IMAGE
/// [`checkpoint::CHARACTER_IMAGE`]: crate::job::checkpoint::CHARACTER_IMAGE
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<GeneratedImages, GenerationError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
