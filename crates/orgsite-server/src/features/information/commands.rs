//! Create, update and delete information blocks

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::form;
use crate::resources::Information;

/// Fields posted by the information form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationForm {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub photo: Option<String>,
    pub enabled: Option<String>,
    pub sort_index: Option<String>,
}

/// Validated information fields
#[derive(Debug, Clone, PartialEq)]
pub struct InformationFields {
    pub title: String,
    pub link: Option<String>,
    pub description: String,
    pub photo: Option<String>,
    pub enabled: bool,
    pub sort_index: i32,
}

/// Errors that can occur when changing information blocks
#[derive(Debug, thiserror::Error)]
pub enum InformationError {
    #[error("Title and description are required")]
    MissingFields,

    #[error("Sort index must be a valid number")]
    InvalidSortIndex,

    #[error("Information block '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl InformationForm {
    /// Validates the form and normalizes blank optionals to `None`
    ///
    /// # Errors
    ///
    /// - Title and description must be non-blank
    /// - `sortIndex` must be an integer when given (blank means 0)
    pub fn validate(&self) -> Result<InformationFields, InformationError> {
        let (Some(title), Some(description)) = (form::text(&self.title), form::text(&self.description))
        else {
            return Err(InformationError::MissingFields);
        };

        let sort_index =
            form::integer(&self.sort_index, 0).map_err(|_| InformationError::InvalidSortIndex)?;

        Ok(InformationFields {
            title,
            link: form::text(&self.link),
            description,
            photo: form::text(&self.photo),
            enabled: form::checkbox(&self.enabled),
            sort_index,
        })
    }
}

/// Insert a new information block under a fresh UUID
#[tracing::instrument(skip(pool, form))]
pub async fn create(pool: &PgPool, form: &InformationForm) -> Result<Information, InformationError> {
    let fields = form.validate()?;

    let row = sqlx::query_as::<_, Information>(
        r#"
        INSERT INTO information (id, title, link, description, photo, enabled, sort_index)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&fields.title)
    .bind(&fields.link)
    .bind(&fields.description)
    .bind(&fields.photo)
    .bind(fields.enabled)
    .bind(fields.sort_index)
    .fetch_one(pool)
    .await?;

    tracing::info!(id = %row.id, "Information block created");
    Ok(row)
}

/// Replace every editable field of an information block
#[tracing::instrument(skip(pool, form))]
pub async fn update(
    pool: &PgPool,
    id: &str,
    form: &InformationForm,
) -> Result<Information, InformationError> {
    let fields = form.validate()?;

    let row = sqlx::query_as::<_, Information>(
        r#"
        UPDATE information
        SET title = $2, link = $3, description = $4, photo = COALESCE($5, photo), enabled = $6,
            sort_index = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&fields.title)
    .bind(&fields.link)
    .bind(&fields.description)
    .bind(&fields.photo)
    .bind(fields.enabled)
    .bind(fields.sort_index)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| InformationError::NotFound(id.to_string()))?;

    tracing::info!(id = %row.id, "Information block updated");
    Ok(row)
}

/// Delete an information block. Returns whether a row was removed.
#[tracing::instrument(skip(pool))]
pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, InformationError> {
    let result = sqlx::query("DELETE FROM information WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
