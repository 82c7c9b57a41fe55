//! Audit data models

use chrono::{DateTime, Utc};
use orgsite_common::datetime::iso8601;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::resources::ResourceType;

// ============================================================================
// Audit Query Constants
// ============================================================================

/// Default number of audit entries returned by the viewer
pub const DEFAULT_AUDIT_QUERY_LIMIT: i64 = 500;

/// Maximum number of audit entries that can be returned in a single query.
pub const MAX_AUDIT_QUERY_LIMIT: i64 = 1000;

/// Serialized, date-normalized copy of one row (or of a captured form)
pub type Snapshot = serde_json::Map<String, JsonValue>;

/// Logical action recorded for an admin mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(AuditError::UnknownAction(s.to_string())),
        }
    }
}

/// What phase 1 resolved about the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditMapping {
    pub resource_type: ResourceType,
    pub resource_id: Option<String>,
    pub action: AuditAction,
}

/// State captured before the handler ran
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedState {
    /// Row snapshot for UPDATE / DELETE
    pub before_state: Option<Snapshot>,
    /// Request payload for CREATE
    pub form_data: Option<Snapshot>,
}

/// Per-request audit context carried from phase 1 to phase 2
///
/// Inserted into the request extensions before the handler runs, so handlers
/// can see it, and moved into the detached phase 2 task afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditContext {
    pub mapping: AuditMapping,
    pub captured: CapturedState,
}

/// Audit log entry from the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub admin_user_id: String,
    pub admin_username: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub route_path: String,
    /// JSON text of the row before the mutation
    pub changes_before: Option<String>,
    /// JSON text of the row after the mutation
    pub changes_after: Option<String>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit entry as served by the viewer, with the change columns parsed back
/// into JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogView {
    pub id: Uuid,
    pub admin_user_id: String,
    pub admin_username: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub route_path: String,
    pub changes_before: Option<JsonValue>,
    pub changes_after: Option<JsonValue>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogEntry> for AuditLogView {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            admin_user_id: entry.admin_user_id,
            admin_username: entry.admin_username,
            action: entry.action,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            route_path: entry.route_path,
            changes_before: parse_changes(entry.changes_before),
            changes_after: parse_changes(entry.changes_after),
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: entry.created_at,
        }
    }
}

/// Stored text that is not valid JSON is handed back verbatim as a string
fn parse_changes(text: Option<String>) -> Option<JsonValue> {
    text.map(|text| serde_json::from_str(&text).unwrap_or_else(|_| JsonValue::String(text)))
}

/// Query parameters for the audit log viewer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub action: Option<AuditAction>,
    pub resource_type: Option<ResourceType>,
    pub resource_id: Option<String>,
    pub admin_user_id: Option<String>,
    /// Maximum number of results to return
    pub limit: Option<i64>,
}

impl AuditLogQuery {
    /// Requested limit, or `default`, clamped to `1..=MAX_AUDIT_QUERY_LIMIT`
    pub fn effective_limit(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, MAX_AUDIT_QUERY_LIMIT)
    }
}

/// Input for creating an audit entry
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditLogEntry {
    pub admin_user_id: String,
    pub admin_username: Option<String>,
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<String>,
    pub route_path: String,
    pub changes_before: Option<Snapshot>,
    pub changes_after: Option<Snapshot>,
    pub ip_address: String,
    pub user_agent: Option<String>,
}

impl NewAuditLogEntry {
    /// Create a builder for constructing audit entries
    pub fn builder() -> NewAuditLogEntryBuilder {
        NewAuditLogEntryBuilder::default()
    }

    pub fn changes_before_json(&self) -> Result<Option<String>, serde_json::Error> {
        self.changes_before.as_ref().map(serde_json::to_string).transpose()
    }

    pub fn changes_after_json(&self) -> Result<Option<String>, serde_json::Error> {
        self.changes_after.as_ref().map(serde_json::to_string).transpose()
    }
}

/// Builder for [`NewAuditLogEntry`]
#[derive(Debug, Clone, Default)]
pub struct NewAuditLogEntryBuilder {
    admin_user_id: Option<String>,
    admin_username: Option<String>,
    action: Option<AuditAction>,
    resource_type: Option<ResourceType>,
    resource_id: Option<String>,
    route_path: Option<String>,
    changes_before: Option<Snapshot>,
    changes_after: Option<Snapshot>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl NewAuditLogEntryBuilder {
    pub fn admin(mut self, user_id: impl Into<String>, username: Option<String>) -> Self {
        self.admin_user_id = Some(user_id.into());
        self.admin_username = username;
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    pub fn resource_id(mut self, resource_id: Option<String>) -> Self {
        self.resource_id = resource_id;
        self
    }

    pub fn route_path(mut self, route_path: impl Into<String>) -> Self {
        self.route_path = Some(route_path.into());
        self
    }

    pub fn changes_before(mut self, changes: Option<Snapshot>) -> Self {
        self.changes_before = changes;
        self
    }

    pub fn changes_after(mut self, changes: Option<Snapshot>) -> Self {
        self.changes_after = changes;
        self
    }

    pub fn ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build the entry, failing if a required field is missing
    pub fn try_build(self) -> Result<NewAuditLogEntry, AuditError> {
        Ok(NewAuditLogEntry {
            admin_user_id: self.admin_user_id.ok_or(AuditError::Incomplete("admin_user_id"))?,
            admin_username: self.admin_username,
            action: self.action.ok_or(AuditError::Incomplete("action"))?,
            resource_type: self.resource_type.ok_or(AuditError::Incomplete("resource_type"))?,
            resource_id: self.resource_id,
            route_path: self.route_path.ok_or(AuditError::Incomplete("route_path"))?,
            changes_before: self.changes_before,
            changes_after: self.changes_after,
            ip_address: self.ip_address.unwrap_or_else(|| "unknown".to_string()),
            user_agent: self.user_agent,
        })
    }
}

/// Internal audit failures. These are logged, never returned to a client.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Admin identity lookup failed: {0}")]
    Identity(#[from] AuthError),

    #[error("Snapshot is not a JSON object: {0}")]
    NotAnObject(String),

    #[error("Unknown audit action: {0}")]
    UnknownAction(String),

    #[error("Incomplete audit entry: {0} is required")]
    Incomplete(&'static str),

    #[error("Audit sink closed")]
    SinkClosed,
}
