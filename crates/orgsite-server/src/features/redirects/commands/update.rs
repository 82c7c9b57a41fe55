//! Update redirect command

use sqlx::PgPool;

use super::{RedirectForm, RedirectFormError};
use crate::features::redirects::queries;
use crate::features::shared::error_helpers::map_unique_violation;
use crate::resources::Redirect;

/// Errors that can occur when updating a redirect
#[derive(Debug, thiserror::Error)]
pub enum UpdateRedirectError {
    #[error(transparent)]
    Form(#[from] RedirectFormError),

    #[error("Slug is already in use")]
    SlugInUse(String),

    #[error("Redirect '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Update the redirect currently stored under `original_slug`
///
/// The form may rename the redirect; the new slug must not belong to another
/// redirect. The click counter is preserved.
#[tracing::instrument(skip(pool, form))]
pub async fn handle(
    pool: &PgPool,
    original_slug: &str,
    form: &RedirectForm,
) -> Result<Redirect, UpdateRedirectError> {
    let fields = form.validate()?;

    if fields.slug != original_slug
        && queries::slug_exists(pool, &fields.slug).await?
    {
        return Err(UpdateRedirectError::SlugInUse(fields.slug));
    }

    let row = sqlx::query_as::<_, Redirect>(
        r#"
        UPDATE redirects
        SET slug = $2, target_url = $3, description = $4, enabled = $5, updated_at = NOW()
        WHERE slug = $1
        RETURNING *
        "#,
    )
    .bind(original_slug)
    .bind(&fields.slug)
    .bind(&fields.target_url)
    .bind(&fields.description)
    .bind(fields.enabled)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        map_unique_violation(
            e,
            UpdateRedirectError::SlugInUse(fields.slug.clone()),
            UpdateRedirectError::Database,
        )
    })?
    .ok_or_else(|| UpdateRedirectError::NotFound(original_slug.to_string()))?;

    if row.slug != original_slug {
        tracing::info!(from = %original_slug, to = %row.slug, "Redirect renamed");
    }
    Ok(row)
}
