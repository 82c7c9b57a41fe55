//! Backup routes, nested under `{admin}/api/dump`
//!
//! - `GET /json` - every content table in one document, stamped with the
//!   time it was generated and the export schema version

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use orgsite_common::datetime::iso8601;
use serde::Serialize;
use sqlx::PgPool;

use crate::api::response::ErrorResponse;
use crate::features::{
    information, leadership, lesson_icons, location, meetings, notes, redirects, AdminState,
};
use crate::resources::{Information, Leader, LessonIcon, Location, Meeting, Note, Redirect};

/// Bumped whenever a table is added to or reshaped in the export
pub const BACKUP_SCHEMA_VERSION: u32 = 1;

/// Full content export. Admin sessions are not part of it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(with = "iso8601")]
    pub generated_at: DateTime<Utc>,
    pub schema_version: u32,
    pub location: Vec<Location>,
    pub leadership: Vec<Leader>,
    pub meetings: Vec<Meeting>,
    pub redirects: Vec<Redirect>,
    pub notes: Vec<Note>,
    pub information: Vec<Information>,
    pub lesson_icons: Vec<LessonIcon>,
}

impl Backup {
    /// Read every table concurrently
    pub async fn collect(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let (location, leadership, meetings, redirects, notes, information, lesson_icons) = tokio::try_join!(
            location::commands::current(pool),
            leadership::queries::list_all(pool),
            meetings::queries::list_all(pool),
            redirects::queries::list_all(pool),
            notes::commands::list_all(pool),
            information::queries::list_all(pool),
            lesson_icons::commands::list_all(pool),
        )?;

        Ok(Self {
            generated_at: Utc::now(),
            schema_version: BACKUP_SCHEMA_VERSION,
            location: location.into_iter().collect(),
            leadership,
            meetings,
            redirects,
            notes,
            information,
            lesson_icons,
        })
    }
}

pub fn backup_routes() -> Router<AdminState> {
    Router::new().route("/json", get(dump_json))
}

#[tracing::instrument(skip(pool))]
async fn dump_json(State(pool): State<PgPool>) -> Result<Response, BackupError> {
    let backup = Backup::collect(&pool).await?;
    tracing::info!(
        meetings = backup.meetings.len(),
        notes = backup.notes.len(),
        redirects = backup.redirects.len(),
        "Generated content backup"
    );
    Ok(Json(backup).into_response())
}

#[derive(Debug, thiserror::Error)]
#[error("backup export failed: {0}")]
struct BackupError(#[from] sqlx::Error);

impl IntoResponse for BackupError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Failed to export backup");
        ErrorResponse::database()
    }
}
