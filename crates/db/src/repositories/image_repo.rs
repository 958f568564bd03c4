//! Upsert of generated image references.

use inkwell_core::generation::GenerationResult;
use inkwell_core::types::DbId;
use sqlx::PgPool;

/// Provides writes to `keyword_images` and `character_images`.
pub struct GeneratedImageRepo;

impl GeneratedImageRepo {
    /// Insert or replace both image references for
    /// `(analysis_id, user_id)` in a single transaction.
    pub async fn upsert(pool: &PgPool, result: &GenerationResult) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO keyword_images (analysis_id, user_id, image_url) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_keyword_images_analysis_user \
             DO UPDATE SET image_url = EXCLUDED.image_url, updated_at = NOW()",
        )
        .bind(result.analysis_id)
        .bind(result.user_id)
        .bind(&result.keyword_image)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO character_images (analysis_id, user_id, image_url) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_character_images_analysis_user \
             DO UPDATE SET image_url = EXCLUDED.image_url, updated_at = NOW()",
        )
        .bind(result.analysis_id)
        .bind(result.user_id)
        .bind(&result.character_image)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            analysis_id = result.analysis_id,
            user_id = result.user_id,
            "Generated image references saved",
        );
        Ok(())
    }

    /// Current `(keyword_url, character_url)` for an analysis, if both exist.
    pub async fn find_urls(
        pool: &PgPool,
        analysis_id: DbId,
        user_id: DbId,
    ) -> Result<Option<(String, String)>, sqlx::Error> {
        sqlx::query_as::<_, (String, String)>(
            "SELECT k.image_url, c.image_url \
             FROM keyword_images k \
             JOIN character_images c \
               ON c.analysis_id = k.analysis_id AND c.user_id = k.user_id \
             WHERE k.analysis_id = $1 AND k.user_id = $2",
        )
        .bind(analysis_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
