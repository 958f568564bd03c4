//! PostgreSQL access for inkwell.
//!
//! Only the two queries the generation workflow needs live here: the
//! context lookup for a diary entry and the upsert of generated image
//! references, plus the adapters exposing them as workflow collaborators.
//! Diary, user and analysis CRUD belong to the main application.

use sqlx::postgres::PgPoolOptions;

pub mod collaborators;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
