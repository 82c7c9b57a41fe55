//! Redirect queries

use sqlx::PgPool;

use crate::resources::Redirect;

pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM redirects WHERE slug = $1)")
        .bind(slug)
        .fetch_one(pool)
        .await
}

/// Every redirect, by slug
pub async fn list_all(pool: &PgPool) -> Result<Vec<Redirect>, sqlx::Error> {
    sqlx::query_as::<_, Redirect>("SELECT * FROM redirects ORDER BY slug")
        .fetch_all(pool)
        .await
}

/// Enabled redirects, by slug
pub async fn list_enabled(pool: &PgPool) -> Result<Vec<Redirect>, sqlx::Error> {
    sqlx::query_as::<_, Redirect>("SELECT * FROM redirects WHERE enabled = TRUE ORDER BY slug")
        .fetch_all(pool)
        .await
}

/// Enabled redirect for `slug`, if any
pub async fn find_enabled(pool: &PgPool, slug: &str) -> Result<Option<Redirect>, sqlx::Error> {
    sqlx::query_as::<_, Redirect>("SELECT * FROM redirects WHERE slug = $1 AND enabled = TRUE")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// Count one visit
pub async fn record_click(pool: &PgPool, slug: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE redirects SET clicks = clicks + 1 WHERE slug = $1 AND enabled = TRUE")
        .bind(slug)
        .execute(pool)
        .await?;
    Ok(())
}
