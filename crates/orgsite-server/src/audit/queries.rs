//! Database queries for the admin audit log

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::models::{AuditError, AuditLogEntry, AuditLogQuery, NewAuditLogEntry, MAX_AUDIT_QUERY_LIMIT};
use crate::resources::ResourceType;

const AUDIT_COLUMNS: &str = "id, admin_user_id, admin_username, action, resource_type, \
     resource_id, route_path, changes_before, changes_after, ip_address, user_agent, created_at";

/// Insert a new audit log entry
///
/// Both change maps are stored as JSON text. Returns the stored row with its
/// generated id and timestamp.
pub async fn create_audit_entry(
    pool: &PgPool,
    entry: &NewAuditLogEntry,
) -> Result<AuditLogEntry, AuditError> {
    let sql = format!(
        r#"
        INSERT INTO admin_audit_log (
            id, admin_user_id, admin_username, action, resource_type, resource_id,
            route_path, changes_before, changes_after, ip_address, user_agent
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {AUDIT_COLUMNS}
        "#
    );

    let record = sqlx::query_as::<_, AuditLogEntry>(&sql)
        .bind(Uuid::new_v4())
        .bind(&entry.admin_user_id)
        .bind(&entry.admin_username)
        .bind(entry.action.as_str())
        .bind(entry.resource_type.as_str())
        .bind(&entry.resource_id)
        .bind(&entry.route_path)
        .bind(entry.changes_before_json()?)
        .bind(entry.changes_after_json()?)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .fetch_one(pool)
        .await?;

    debug!(
        audit_id = %record.id,
        action = %entry.action,
        resource_type = %entry.resource_type,
        "Created audit log entry"
    );

    Ok(record)
}

/// List audit entries newest first, applying the optional filters
pub async fn list_audit_log(
    pool: &PgPool,
    query: &AuditLogQuery,
    default_limit: i64,
) -> Result<Vec<AuditLogEntry>, AuditError> {
    let limit = query.effective_limit(default_limit);

    let mut sql = format!("SELECT {AUDIT_COLUMNS} FROM admin_audit_log WHERE 1=1");
    let mut bind_count = 1;

    if query.action.is_some() {
        sql.push_str(&format!(" AND action = ${}", bind_count));
        bind_count += 1;
    }
    if query.resource_type.is_some() {
        sql.push_str(&format!(" AND resource_type = ${}", bind_count));
        bind_count += 1;
    }
    if query.resource_id.is_some() {
        sql.push_str(&format!(" AND resource_id = ${}", bind_count));
        bind_count += 1;
    }
    if query.admin_user_id.is_some() {
        sql.push_str(&format!(" AND admin_user_id = ${}", bind_count));
        bind_count += 1;
    }

    sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ${}", bind_count));

    let mut query_builder = sqlx::query_as::<_, AuditLogEntry>(&sql);

    // Bind parameters in the order the conditions were added
    if let Some(action) = query.action {
        query_builder = query_builder.bind(action.as_str());
    }
    if let Some(resource_type) = query.resource_type {
        query_builder = query_builder.bind(resource_type.as_str());
    }
    if let Some(ref resource_id) = query.resource_id {
        query_builder = query_builder.bind(resource_id);
    }
    if let Some(ref admin_user_id) = query.admin_user_id {
        query_builder = query_builder.bind(admin_user_id);
    }

    let records = query_builder.bind(limit).fetch_all(pool).await?;

    debug!(count = records.len(), limit, "Queried audit log");

    Ok(records)
}

/// Full history of one resource, newest first
pub async fn get_resource_trail(
    pool: &PgPool,
    resource_type: ResourceType,
    resource_id: &str,
    limit: Option<i64>,
) -> Result<Vec<AuditLogEntry>, AuditError> {
    let limit = limit.unwrap_or(MAX_AUDIT_QUERY_LIMIT).clamp(1, MAX_AUDIT_QUERY_LIMIT);

    let sql = format!(
        "SELECT {AUDIT_COLUMNS} FROM admin_audit_log \
         WHERE resource_type = $1 AND resource_id = $2 \
         ORDER BY created_at DESC LIMIT $3"
    );

    let records = sqlx::query_as::<_, AuditLogEntry>(&sql)
        .bind(resource_type.as_str())
        .bind(resource_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    debug!(
        resource_type = %resource_type,
        resource_id = %resource_id,
        count = records.len(),
        "Retrieved resource audit trail"
    );

    Ok(records)
}
