//! Postgres lookups for resource rows
//!
//! Each row model declares its table and natural-key column through
//! [`ResourceRow`]; [`PgResourceStore`] maps a [`ResourceType`] onto the
//! matching model with a plain `match`.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use tracing::debug;

use super::models::{Information, Leader, LessonIcon, Location, Meeting, Note, Redirect};
use super::ResourceType;
use crate::audit::{AuditError, Snapshot, SnapshotSource};

/// A row model that can be looked up by its natural key
pub trait ResourceRow: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin {
    const TABLE: &'static str;
    const KEY_COLUMN: &'static str;
}

impl ResourceRow for Information {
    const TABLE: &'static str = "information";
    const KEY_COLUMN: &'static str = "id";
}

impl ResourceRow for Leader {
    const TABLE: &'static str = "leadership";
    const KEY_COLUMN: &'static str = "id";
}

impl ResourceRow for Meeting {
    const TABLE: &'static str = "meetings";
    const KEY_COLUMN: &'static str = "id";
}

impl ResourceRow for Note {
    const TABLE: &'static str = "notes";
    const KEY_COLUMN: &'static str = "id";
}

impl ResourceRow for Redirect {
    const TABLE: &'static str = "redirects";
    const KEY_COLUMN: &'static str = "slug";
}

impl ResourceRow for Location {
    const TABLE: &'static str = "location";
    const KEY_COLUMN: &'static str = "id";
}

impl ResourceRow for LessonIcon {
    const TABLE: &'static str = "lesson_icons";
    const KEY_COLUMN: &'static str = "category_name";
}

/// Fetch a single row by natural key
pub async fn find_row<R: ResourceRow>(pool: &PgPool, key: &str) -> Result<Option<R>, sqlx::Error> {
    let sql = format!("SELECT * FROM {} WHERE {} = $1", R::TABLE, R::KEY_COLUMN);

    sqlx::query_as::<_, R>(&sql).bind(key).fetch_optional(pool).await
}

/// Serialize a row into a snapshot map
pub fn to_snapshot<R: Serialize>(row: &R) -> Result<Snapshot, AuditError> {
    match serde_json::to_value(row)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(AuditError::NotAnObject(other.to_string())),
    }
}

/// Snapshot source backed by the resource tables
#[derive(Clone)]
pub struct PgResourceStore {
    pool: PgPool,
}

impl PgResourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch<R: ResourceRow>(&self, key: &str) -> Result<Option<Snapshot>, AuditError> {
        let row = find_row::<R>(&self.pool, key).await?;
        debug!(table = R::TABLE, key = %key, found = row.is_some(), "Fetched resource row");
        row.as_ref().map(to_snapshot).transpose()
    }
}

#[async_trait]
impl SnapshotSource for PgResourceStore {
    async fn find_by_key(
        &self,
        resource_type: ResourceType,
        key: &str,
    ) -> Result<Option<Snapshot>, AuditError> {
        let key = resource_type.canonical_key(key);
        let key = key.as_str();
        match resource_type {
            ResourceType::Information => self.fetch::<Information>(key).await,
            ResourceType::Leadership => self.fetch::<Leader>(key).await,
            ResourceType::Meetings => self.fetch::<Meeting>(key).await,
            ResourceType::Notes => self.fetch::<Note>(key).await,
            ResourceType::Redirects => self.fetch::<Redirect>(key).await,
            ResourceType::Location => self.fetch::<Location>(key).await,
            ResourceType::LessonIcons => self.fetch::<LessonIcon>(key).await,
        }
    }
}
