//! Create, update and delete meetings

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::form;
use crate::resources::Meeting;

/// Fields posted by the meeting form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingForm {
    pub title: Option<String>,
    pub date: Option<String>,
    pub presenter: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "descriptionMD")]
    pub description_md: Option<String>,
    pub photo: Option<String>,
}

/// Validated meeting fields
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingFields {
    pub title: String,
    pub date: DateTime<Utc>,
    pub presenter: Option<String>,
    pub link: Option<String>,
    pub description_md: Option<String>,
    pub photo: Option<String>,
}

/// Errors that can occur when changing meetings
#[derive(Debug, thiserror::Error)]
pub enum MeetingError {
    #[error("Title and date are required")]
    MissingFields,

    #[error("Invalid date")]
    InvalidDate,

    #[error("Meeting '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl MeetingForm {
    pub fn validate(&self) -> Result<MeetingFields, MeetingError> {
        let (Some(title), Some(date)) = (form::text(&self.title), form::text(&self.date)) else {
            return Err(MeetingError::MissingFields);
        };
        let date = form::timestamp(&date).ok_or(MeetingError::InvalidDate)?;

        Ok(MeetingFields {
            title,
            date,
            presenter: form::text(&self.presenter),
            link: form::text(&self.link),
            description_md: form::text(&self.description_md),
            photo: form::text(&self.photo),
        })
    }
}

#[tracing::instrument(skip(pool, form))]
pub async fn create(pool: &PgPool, form: &MeetingForm) -> Result<Meeting, MeetingError> {
    let fields = form.validate()?;

    let row = sqlx::query_as::<_, Meeting>(
        r#"
        INSERT INTO meetings (id, title, date, presenter, link, description_md, photo)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&fields.title)
    .bind(fields.date)
    .bind(&fields.presenter)
    .bind(&fields.link)
    .bind(&fields.description_md)
    .bind(&fields.photo)
    .fetch_one(pool)
    .await?;

    tracing::info!(id = %row.id, date = %row.date, "Meeting created");
    Ok(row)
}

#[tracing::instrument(skip(pool, form))]
pub async fn update(pool: &PgPool, id: &str, form: &MeetingForm) -> Result<Meeting, MeetingError> {
    let fields = form.validate()?;

    let row = sqlx::query_as::<_, Meeting>(
        r#"
        UPDATE meetings
        SET title = $2, date = $3, presenter = $4, link = $5, description_md = $6,
            photo = COALESCE($7, photo), updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&fields.title)
    .bind(fields.date)
    .bind(&fields.presenter)
    .bind(&fields.link)
    .bind(&fields.description_md)
    .bind(&fields.photo)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| MeetingError::NotFound(id.to_string()))?;

    tracing::info!(id = %row.id, "Meeting updated");
    Ok(row)
}

#[tracing::instrument(skip(pool))]
pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, MeetingError> {
    let result = sqlx::query("DELETE FROM meetings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
