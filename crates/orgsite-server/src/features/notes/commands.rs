//! Create, update and delete meeting notes

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::form;
use crate::resources::Note;

/// Fields posted by the notes form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteForm {
    pub title: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteFields {
    pub title: String,
    pub date: DateTime<Utc>,
    /// Markdown body, kept verbatim
    pub notes: String,
    pub tags: Option<String>,
}

/// Errors that can occur when changing notes
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("Title and date are required")]
    MissingFields,

    #[error("Invalid date")]
    InvalidDate,

    #[error("Notes body is required")]
    MissingBody,

    #[error("Note '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl NoteForm {
    pub fn validate(&self) -> Result<NoteFields, NoteError> {
        let (Some(title), Some(date)) = (form::text(&self.title), form::text(&self.date)) else {
            return Err(NoteError::MissingFields);
        };
        let date = form::timestamp(&date).ok_or(NoteError::InvalidDate)?;

        let notes = match self.notes.as_deref() {
            Some(body) if !body.trim().is_empty() => body.to_string(),
            _ => return Err(NoteError::MissingBody),
        };

        Ok(NoteFields {
            title,
            date,
            notes,
            tags: form::text(&self.tags),
        })
    }
}

#[tracing::instrument(skip(pool, form))]
pub async fn create(pool: &PgPool, form: &NoteForm) -> Result<Note, NoteError> {
    let fields = form.validate()?;

    let row = sqlx::query_as::<_, Note>(
        r#"
        INSERT INTO notes (id, title, date, notes, tags)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&fields.title)
    .bind(fields.date)
    .bind(&fields.notes)
    .bind(&fields.tags)
    .fetch_one(pool)
    .await?;

    tracing::info!(id = %row.id, "Note created");
    Ok(row)
}

#[tracing::instrument(skip(pool, form))]
pub async fn update(pool: &PgPool, id: &str, form: &NoteForm) -> Result<Note, NoteError> {
    let fields = form.validate()?;

    sqlx::query_as::<_, Note>(
        r#"
        UPDATE notes
        SET title = $2, date = $3, notes = $4, tags = $5, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&fields.title)
    .bind(fields.date)
    .bind(&fields.notes)
    .bind(&fields.tags)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| NoteError::NotFound(id.to_string()))
}

#[tracing::instrument(skip(pool))]
pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, NoteError> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Every note, newest first
pub async fn list_all(pool: &PgPool) -> Result<Vec<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>("SELECT * FROM notes ORDER BY date DESC")
        .fetch_all(pool)
        .await
}
