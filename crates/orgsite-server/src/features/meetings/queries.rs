//! Meeting queries

use sqlx::PgPool;

use crate::resources::Meeting;

/// Every meeting, newest first
pub async fn list_all(pool: &PgPool) -> Result<Vec<Meeting>, sqlx::Error> {
    sqlx::query_as::<_, Meeting>("SELECT * FROM meetings ORDER BY date DESC")
        .fetch_all(pool)
        .await
}
