//! Information block queries

use sqlx::PgPool;

use crate::resources::Information;

/// Every block, in display order
pub async fn list_all(pool: &PgPool) -> Result<Vec<Information>, sqlx::Error> {
    sqlx::query_as::<_, Information>("SELECT * FROM information ORDER BY sort_index, title")
        .fetch_all(pool)
        .await
}

/// Enabled blocks only, in display order
pub async fn list_enabled(pool: &PgPool) -> Result<Vec<Information>, sqlx::Error> {
    sqlx::query_as::<_, Information>(
        "SELECT * FROM information WHERE enabled = TRUE ORDER BY sort_index, title",
    )
    .fetch_all(pool)
    .await
}
