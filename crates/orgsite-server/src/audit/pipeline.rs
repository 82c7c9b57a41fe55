//! Two-phase audit interceptor
//!
//! Phase 1 runs before the wrapped service: it resolves the admin, the
//! resource mapping and the action, then snapshots the row (UPDATE/DELETE) or
//! captures the payload (CREATE). Phase 2 runs in a detached task once the
//! wrapped service has answered: it captures the after state and writes one
//! audit entry. Neither phase can fail the request.

use axum::{
    extract::{ConnectInfo, Request},
    http::{header::USER_AGENT, HeaderMap, Method},
    response::Response,
};
use serde_json::Value as JsonValue;
use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio_util::task::TaskTracker;
use tower::{Layer, Service};
use tracing::{debug, error, info, warn};

use super::body;
use super::classifier::classify;
use super::models::{
    AuditAction, AuditContext, AuditError, AuditLogEntry, AuditMapping, CapturedState, NewAuditLogEntry,
    Snapshot,
};
use super::router::ResourceRouter;
use super::snapshot::{SnapshotSource, Snapshotter};
use super::store::AuditSink;
use crate::auth::{AdminIdentity, AdminIdentityResolver};
use crate::resources::ResourceType;

/// Form fields checked, in order, for the id of a freshly created row
const CREATED_ID_FIELDS: [&str; 3] = ["id", "slug", "categoryName"];

/// Tunables for the audit pipeline
#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub enabled: bool,
    pub admin_prefix: String,
    /// Largest body phase 1 will buffer for a CREATE
    pub max_capture_bytes: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_prefix: "/admin".to_string(),
            max_capture_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Shared, immutable pipeline state
pub struct AuditState {
    router: ResourceRouter,
    snapshotter: Snapshotter,
    sink: Arc<dyn AuditSink>,
    identity: Arc<dyn AdminIdentityResolver>,
    settings: AuditSettings,
    viewer_path: String,
    tasks: TaskTracker,
}

impl AuditState {
    pub fn new(
        settings: AuditSettings,
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn AuditSink>,
        identity: Arc<dyn AdminIdentityResolver>,
    ) -> Result<Self, regex::Error> {
        let router = ResourceRouter::new(&settings.admin_prefix)?;
        let viewer_path = format!("{}/audit-log", router.prefix());

        Ok(Self {
            router,
            snapshotter: Snapshotter::new(source),
            sink,
            identity,
            settings,
            viewer_path,
            tasks: TaskTracker::new(),
        })
    }

    /// Admin mutation outside the audit-log viewer
    pub fn is_auditable(&self, method: &Method, path: &str) -> bool {
        self.settings.enabled
            && matches!(*method, Method::POST | Method::PUT | Method::DELETE)
            && self.router.is_admin_path(path)
            && !self.is_viewer_path(path)
    }

    fn is_viewer_path(&self, path: &str) -> bool {
        path.strip_prefix(self.viewer_path.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    async fn current_admin(&self, headers: &HeaderMap) -> Option<AdminIdentity> {
        match self.identity.current_admin(headers).await {
            Ok(admin) => admin,
            Err(e) => {
                warn!(error = %e, "Admin lookup failed, skipping audit");
                None
            },
        }
    }

    /// Phase 1. Returns the (possibly rebuilt) request and the context to
    /// carry into phase 2, or `None` when the request is not audited.
    pub async fn pre_capture(&self, request: Request, meta: &RequestMeta) -> (Request, Option<AuditContext>) {
        if self.current_admin(&meta.headers).await.is_none() {
            debug!(path = %meta.path, "No admin identity, skipping audit");
            return (request, None);
        }

        let Some(mapping) = self.router.resolve(&meta.path) else {
            debug!(path = %meta.path, "Unmapped admin route, skipping audit");
            return (request, None);
        };

        let resource_type = mapping.resource_type();
        let resource_id = mapping.resource_id(&meta.path);
        let action = classify(&meta.method, &meta.path, resource_id.as_deref());

        let mut captured = CapturedState::default();
        let request = match action {
            AuditAction::Create => {
                let (request, form_data) =
                    body::extract(request, true, self.settings.max_capture_bytes).await;
                captured.form_data = form_data;
                request
            },
            AuditAction::Update | AuditAction::Delete => {
                captured.before_state =
                    self.snapshotter.snapshot(resource_type, resource_id.as_deref()).await;
                request
            },
        };

        debug!(
            action = %action,
            resource_type = %resource_type,
            resource_id = ?resource_id,
            has_before = captured.before_state.is_some(),
            has_form = captured.form_data.is_some(),
            "Audit pre-capture complete"
        );

        let mapping = AuditMapping { resource_type, resource_id, action };
        (request, Some(AuditContext { mapping, captured }))
    }

    /// Phase 2 error boundary
    pub async fn post_capture(&self, meta: RequestMeta, context: AuditContext) {
        let route_path = meta.path.clone();

        match self.try_post_capture(meta, context).await {
            Ok(Some(entry)) => {
                info!(
                    audit_id = %entry.id,
                    action = %entry.action,
                    resource_type = %entry.resource_type,
                    resource_id = ?entry.resource_id,
                    "Audit log entry created"
                );
            },
            Ok(None) => debug!(path = %route_path, "Audit skipped after handler"),
            Err(e) => {
                error!(path = %route_path, error = %e, "Failed to create audit log entry");
            },
        }
    }

    async fn try_post_capture(
        &self,
        meta: RequestMeta,
        context: AuditContext,
    ) -> Result<Option<AuditLogEntry>, AuditError> {
        let Some(admin) = self.identity.current_admin(&meta.headers).await? else {
            return Ok(None);
        };
        let Some(mapping) = self.router.resolve(&meta.path) else {
            return Ok(None);
        };

        let AuditContext { mapping: stored, captured } = context;
        let resource_type = stored.resource_type;
        let resource_id = stored.resource_id.or_else(|| mapping.resource_id(&meta.path));

        let (resource_id, changes_after) = match stored.action {
            AuditAction::Delete => (resource_id, None),
            AuditAction::Update => {
                let after = self.snapshotter.snapshot(resource_type, resource_id.as_deref()).await;
                (resource_id, after)
            },
            AuditAction::Create => {
                self.resolve_created(resource_type, resource_id, captured.form_data).await
            },
        };

        let entry = NewAuditLogEntry::builder()
            .admin(admin.user_id, admin.username)
            .action(stored.action)
            .resource_type(resource_type)
            .resource_id(resource_id)
            .route_path(meta.path)
            .changes_before(captured.before_state)
            .changes_after(changes_after)
            .ip_address(meta.ip_address)
            .user_agent(meta.user_agent)
            .try_build()?;

        self.sink.record(entry).await.map(Some)
    }

    /// After state of a CREATE: the stored row if one can be found by the
    /// path id or an id inferred from the payload, otherwise the payload
    async fn resolve_created(
        &self,
        resource_type: ResourceType,
        resource_id: Option<String>,
        form_data: Option<Snapshot>,
    ) -> (Option<String>, Option<Snapshot>) {
        let resource_id = resource_id.or_else(|| {
            form_data
                .as_ref()
                .and_then(created_id)
                .map(|id| resource_type.canonical_key(&id))
        });

        match self.snapshotter.snapshot(resource_type, resource_id.as_deref()).await {
            Some(row) => (resource_id, Some(row)),
            None => (resource_id, form_data),
        }
    }
}

/// Id of a created row as named in its payload
fn created_id(form_data: &Snapshot) -> Option<String> {
    CREATED_ID_FIELDS.iter().find_map(|field| match form_data.get(*field)? {
        JsonValue::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        JsonValue::Number(value) => Some(value.to_string()),
        _ => None,
    })
}

/// Request facts phase 2 needs after the request itself is gone
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub ip_address: String,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_request(request: &Request) -> Self {
        let headers = request.headers().clone();

        let ip_address = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .or_else(|| {
                headers
                    .get("x-forwarded-for")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.split(',').next())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            headers,
            ip_address,
            user_agent,
        }
    }
}

/// Audit layer
///
/// Wrap the whole application with it; it only acts on admin mutations.
#[derive(Clone)]
pub struct AuditLayer {
    state: Arc<AuditState>,
}

impl AuditLayer {
    pub fn new(state: AuditState) -> Self {
        Self { state: Arc::new(state) }
    }

    /// Tracker of in-flight phase-2 writes, for draining on shutdown
    pub fn tasks(&self) -> TaskTracker {
        self.state.tasks.clone()
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditMiddleware { inner, state: self.state.clone() }
    }
}

/// Audit middleware service
#[derive(Clone)]
pub struct AuditMiddleware<S> {
    inner: S,
    state: Arc<AuditState>,
}

impl<S> Service<Request> for AuditMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // Keep the service that was polled ready
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let state = self.state.clone();

        Box::pin(async move {
            if !state.is_auditable(request.method(), request.uri().path()) {
                return inner.call(request).await;
            }

            let meta = RequestMeta::from_request(&request);
            let (mut request, context) = state.pre_capture(request, &meta).await;
            if let Some(ref context) = context {
                request.extensions_mut().insert(context.clone());
            }

            let response = inner.call(request).await?;

            if let Some(context) = context {
                debug!(
                    method = %meta.method,
                    path = %meta.path,
                    status = %response.status(),
                    "Admin mutation handled"
                );

                let tasks = state.tasks.clone();
                tasks.spawn(async move {
                    state.post_capture(meta, context).await;
                });
            }

            Ok(response)
        })
    }
}
