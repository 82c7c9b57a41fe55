//! Lesson icon commands
//!
//! Category names are stored lower-cased, so lookups are case-insensitive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::validation::{validate_iconify_id, IconifyIdError};
use crate::resources::LessonIcon;

/// Body of `POST {admin}/lesson-icons/api`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonIconCommand {
    pub category_name: Option<String>,
    pub iconify_id: Option<String>,
}

/// Body of `PUT {admin}/lesson-icons/api/:categoryName`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonIconCommand {
    pub iconify_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LessonIconError {
    #[error("Category name and iconify ID are required")]
    MissingFields,

    #[error(transparent)]
    InvalidIconifyId(#[from] IconifyIdError),

    #[error("Icon mapping for this category already exists")]
    AlreadyExists(String),

    #[error("Icon mapping not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn required(value: &Option<String>) -> Result<&str, LessonIconError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(LessonIconError::MissingFields)
}

impl CreateLessonIconCommand {
    /// Returns the normalized `(category, iconify id)` pair
    pub fn validate(&self) -> Result<(String, String), LessonIconError> {
        let category = required(&self.category_name)?.to_lowercase();
        let iconify_id = required(&self.iconify_id)?;
        validate_iconify_id(iconify_id)?;
        Ok((category, iconify_id.to_string()))
    }
}

impl UpdateLessonIconCommand {
    pub fn validate(&self) -> Result<String, LessonIconError> {
        let iconify_id = required(&self.iconify_id)?;
        validate_iconify_id(iconify_id)?;
        Ok(iconify_id.to_string())
    }
}

async fn find(pool: &PgPool, category: &str) -> Result<Option<LessonIcon>, sqlx::Error> {
    crate::resources::find_row::<LessonIcon>(pool, category).await
}

#[tracing::instrument(skip(pool, command))]
pub async fn create(
    pool: &PgPool,
    command: &CreateLessonIconCommand,
) -> Result<LessonIcon, LessonIconError> {
    let (category, iconify_id) = command.validate()?;

    if find(pool, &category).await?.is_some() {
        return Err(LessonIconError::AlreadyExists(category));
    }

    let row = sqlx::query_as::<_, LessonIcon>(
        "INSERT INTO lesson_icons (category_name, iconify_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(&category)
    .bind(&iconify_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(category = %row.category_name, icon = %row.iconify_id, "Lesson icon created");
    Ok(row)
}

#[tracing::instrument(skip(pool, command))]
pub async fn update(
    pool: &PgPool,
    category_name: &str,
    command: &UpdateLessonIconCommand,
) -> Result<LessonIcon, LessonIconError> {
    let iconify_id = command.validate()?;
    let category = category_name.to_lowercase();

    sqlx::query_as::<_, LessonIcon>(
        r#"
        UPDATE lesson_icons SET iconify_id = $2, updated_at = NOW()
        WHERE category_name = $1
        RETURNING *
        "#,
    )
    .bind(&category)
    .bind(&iconify_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LessonIconError::NotFound(category.clone()))
}

/// Delete a mapping. Unlike the content tables, a missing mapping is an error.
#[tracing::instrument(skip(pool))]
pub async fn delete(pool: &PgPool, category_name: &str) -> Result<(), LessonIconError> {
    let category = category_name.to_lowercase();

    let result = sqlx::query("DELETE FROM lesson_icons WHERE category_name = $1")
        .bind(&category)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LessonIconError::NotFound(category));
    }
    Ok(())
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<LessonIcon>, sqlx::Error> {
    sqlx::query_as::<_, LessonIcon>("SELECT * FROM lesson_icons ORDER BY category_name")
        .fetch_all(pool)
        .await
}

/// Category to iconify id lookup table
pub fn icon_map(icons: Vec<LessonIcon>) -> BTreeMap<String, String> {
    icons
        .into_iter()
        .map(|icon| (icon.category_name.to_lowercase(), icon.iconify_id))
        .collect()
}
