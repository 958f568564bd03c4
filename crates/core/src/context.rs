//! Read-only inputs fetched once per run from the context resolver.

use serde::Serialize;

use crate::types::DbId;

/// Prompt material and persistence identifiers for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobContext {
    /// Keywords extracted by the diary analysis, embedded into both prompts.
    pub keywords: String,
    /// Symbolic character identifier, resolved to a base asset file.
    pub subject_type: String,
    /// Analysis row the generated images attach to.
    pub analysis_id: DbId,
    /// Owner of the diary entry.
    pub user_id: DbId,
}
