//! Delete redirect command

use sqlx::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum DeleteRedirectError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Delete a redirect by slug. Returns whether a row was removed.
#[tracing::instrument(skip(pool))]
pub async fn handle(pool: &PgPool, slug: &str) -> Result<bool, DeleteRedirectError> {
    let result = sqlx::query("DELETE FROM redirects WHERE slug = $1")
        .bind(slug)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
