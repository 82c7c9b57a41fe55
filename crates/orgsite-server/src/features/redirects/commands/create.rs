//! Create redirect command

use sqlx::PgPool;

use super::{RedirectForm, RedirectFormError};
use crate::features::redirects::queries;
use crate::features::shared::error_helpers::map_unique_violation;
use crate::resources::Redirect;

/// Errors that can occur when creating a redirect
#[derive(Debug, thiserror::Error)]
pub enum CreateRedirectError {
    #[error(transparent)]
    Form(#[from] RedirectFormError),

    #[error("Slug is already in use")]
    SlugInUse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Insert a new redirect. The slug is the primary key.
///
/// # Errors
///
/// - Form validation errors
/// - [`CreateRedirectError::SlugInUse`] if the slug already exists
#[tracing::instrument(skip(pool, form))]
pub async fn handle(pool: &PgPool, form: &RedirectForm) -> Result<Redirect, CreateRedirectError> {
    let fields = form.validate()?;

    if queries::slug_exists(pool, &fields.slug).await? {
        return Err(CreateRedirectError::SlugInUse(fields.slug));
    }

    let row = sqlx::query_as::<_, Redirect>(
        r#"
        INSERT INTO redirects (slug, target_url, description, enabled)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&fields.slug)
    .bind(&fields.target_url)
    .bind(&fields.description)
    .bind(fields.enabled)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        map_unique_violation(
            e,
            CreateRedirectError::SlugInUse(fields.slug.clone()),
            CreateRedirectError::Database,
        )
    })?;

    tracing::info!(slug = %row.slug, target = %row.target_url, "Redirect created");
    Ok(row)
}
