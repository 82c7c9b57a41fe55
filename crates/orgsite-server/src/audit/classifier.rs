//! Derives the logical action of an admin mutation from its method and path

use axum::http::Method;

use super::models::AuditAction;

/// Classify a request
///
/// Rules apply in order: explicit deletes, `.../new` creates, POSTs to a
/// collection-style `api` route without an id, then everything else is an
/// update. A POST to an id-bearing route lands in the final rule.
pub fn classify(method: &Method, path: &str, resource_id: Option<&str>) -> AuditAction {
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let last = segments.clone().last();

    if *method == Method::DELETE || last == Some("delete") {
        return AuditAction::Delete;
    }

    if *method == Method::POST {
        if last == Some("new") {
            return AuditAction::Create;
        }
        if resource_id.is_none() && segments.any(|segment| segment == "api") {
            return AuditAction::Create;
        }
    }

    AuditAction::Update
}
