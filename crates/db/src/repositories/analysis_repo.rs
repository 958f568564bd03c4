//! Read-only lookup of the analysis context behind a diary entry.

use inkwell_core::context::JobContext;
use inkwell_core::types::DbId;
use sqlx::{FromRow, PgPool};

/// Joined row of an analysis, its entry and the entry's owner.
#[derive(Debug, FromRow)]
struct ContextRow {
    analysis_id: DbId,
    user_id: DbId,
    keywords: Option<String>,
    character_type: Option<String>,
}

impl From<ContextRow> for JobContext {
    fn from(row: ContextRow) -> Self {
        JobContext {
            keywords: row.keywords.unwrap_or_default(),
            subject_type: row.character_type.unwrap_or_default(),
            analysis_id: row.analysis_id,
            user_id: row.user_id,
        }
    }
}

/// Provides the context lookup for generation jobs.
pub struct AnalysisRepo;

impl AnalysisRepo {
    /// Fetch the generation context for a diary entry.
    ///
    /// Returns `None` when the entry has not been analysed yet. Missing
    /// keywords or character type come back as empty strings; the workflow
    /// rejects them.
    pub async fn find_context(
        pool: &PgPool,
        entry_id: DbId,
    ) -> Result<Option<JobContext>, sqlx::Error> {
        let row = sqlx::query_as::<_, ContextRow>(
            "SELECT a.id AS analysis_id, e.user_id, a.keywords, u.character_type \
             FROM diary_analyses a \
             JOIN diary_entries e ON e.id = a.entry_id \
             JOIN users u ON u.id = e.user_id \
             WHERE a.entry_id = $1",
        )
        .bind(entry_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(JobContext::from))
    }
}
