//! Audit log routes, nested under `{admin}/audit-log`
//!
//! - `GET /` - newest entries first. Optional query parameters: `action`,
//!   `resourceType`, `resourceId`, `adminUserId`, `limit`.
//! - `GET /:resource_type/:resource_id` - full history of one resource
//!
//! Stored change maps are returned as parsed JSON.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::audit::{self, AuditError, AuditLogQuery, AuditLogView};
use crate::features::AdminState;
use crate::resources::ResourceType;

pub fn audit_log_routes() -> Router<AdminState> {
    Router::new()
        .route("/", get(list_entries))
        .route("/:resource_type/:resource_id", get(resource_trail))
}

#[tracing::instrument(skip(state))]
async fn list_entries(
    State(state): State<AdminState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Response, AuditLogApiError> {
    let limit = query.effective_limit(state.audit_viewer_limit);
    let entries = audit::list_audit_log(&state.db, &query, state.audit_viewer_limit).await?;
    let views: Vec<AuditLogView> = entries.into_iter().map(AuditLogView::from).collect();

    Ok(ApiResponse::success_with_meta(views, json!({ "limit": limit })).into_response())
}

#[tracing::instrument(skip(state))]
async fn resource_trail(
    State(state): State<AdminState>,
    Path((resource_type, resource_id)): Path<(ResourceType, String)>,
) -> Result<Response, AuditLogApiError> {
    let entries = audit::get_resource_trail(&state.db, resource_type, &resource_id, None).await?;
    let views: Vec<AuditLogView> = entries.into_iter().map(AuditLogView::from).collect();

    Ok(ApiResponse::success(views).into_response())
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct AuditLogApiError(#[from] AuditError);

impl IntoResponse for AuditLogApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Failed to read the audit log");
        ErrorResponse::database()
    }
}
