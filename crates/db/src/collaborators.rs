//! PostgreSQL-backed workflow collaborators.

use inkwell_core::context::JobContext;
use inkwell_core::generation::GenerationResult;
use inkwell_core::types::JobKey;
use inkwell_pipeline::collaborators::{BoxError, ContextResolver, ResultSink};

use crate::repositories::{AnalysisRepo, GeneratedImageRepo};
use crate::DbPool;

/// Reads the job context from the diary analysis tables.
#[derive(Clone)]
pub struct PgContextResolver {
    pool: DbPool,
}

impl PgContextResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ContextResolver for PgContextResolver {
    async fn resolve(&self, key: JobKey) -> Result<Option<JobContext>, BoxError> {
        Ok(AnalysisRepo::find_context(&self.pool, key).await?)
    }
}

/// Upserts generated image references.
#[derive(Clone)]
pub struct PgResultSink {
    pool: DbPool,
}

impl PgResultSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ResultSink for PgResultSink {
    async fn save(&self, result: &GenerationResult) -> Result<(), BoxError> {
        GeneratedImageRepo::upsert(&self.pool, result).await?;
        Ok(())
    }
}
