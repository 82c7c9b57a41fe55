//! Leadership queries

use sqlx::PgPool;

use crate::resources::Leader;

/// Current leaders first, then alumni by most recent graduation
pub async fn list_all(pool: &PgPool) -> Result<Vec<Leader>, sqlx::Error> {
    sqlx::query_as::<_, Leader>(
        r#"
        SELECT * FROM leadership
        ORDER BY is_current DESC, sort_order, grad_year DESC, grad_term, name
        "#,
    )
    .fetch_all(pool)
    .await
}
