//! Feature modules for the organization site
//!
//! Each feature is a vertical slice with its own commands, queries and routes.
//!
//! # Features
//!
//! - **information**: info page blocks
//! - **leadership**: leadership roster
//! - **meetings**: meetings and events
//! - **notes**: meeting notes
//! - **redirects**: short links and the public `/redir` endpoint
//! - **location**: the current meeting location
//! - **lesson_icons**: icon mappings for lesson categories
//! - **audit_log**: read-only view of the admin audit log
//! - **backup**: JSON export of every content table
//!
//! Admin routes answer form posts with `303 See Other` to the resource's
//! listing page. Auditing happens outside the routers, in
//! [`crate::audit::AuditLayer`].

pub mod audit_log;
pub mod backup;
pub mod information;
pub mod leadership;
pub mod lesson_icons;
pub mod location;
pub mod meetings;
pub mod notes;
pub mod redirects;
pub mod shared;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Router,
};
use sqlx::PgPool;

use crate::api::response::ApiResponse;
use crate::auth::guard::{logout, LogoutState};
use crate::auth::{AdminGuard, AdminIdentity};
use crate::resources::ResourceType;

/// Shared state for the admin routes
#[derive(Clone)]
pub struct AdminState {
    pub db: PgPool,
    /// Admin path prefix, e.g. `/admin`
    pub prefix: Arc<str>,
    /// Audit entries returned when the viewer is given no limit
    pub audit_viewer_limit: i64,
}

impl AdminState {
    pub fn new(db: PgPool, prefix: &str, audit_viewer_limit: i64) -> Self {
        Self {
            db,
            prefix: Arc::from(prefix.trim_end_matches('/')),
            audit_viewer_limit,
        }
    }

    /// `303` to the listing page of `resource`
    pub fn back_to(&self, resource: ResourceType) -> Redirect {
        Redirect::to(&format!("{}/{}", self.prefix, resource))
    }

    /// `303` to the console home
    pub fn back_to_console(&self) -> Redirect {
        Redirect::to(&self.prefix)
    }
}

impl FromRef<AdminState> for PgPool {
    fn from_ref(state: &AdminState) -> Self {
        state.db.clone()
    }
}

/// Admin console mounted at the state's prefix
///
/// Everything except `POST /logout` sits behind `guard`.
pub fn admin_router(state: AdminState, guard: AdminGuard, logout_state: LogoutState) -> Router {
    let prefix = state.prefix.to_string();

    let guarded = Router::new()
        .route("/", get(console_home))
        .nest("/information", information::information_admin_routes())
        .nest("/leadership", leadership::leadership_admin_routes())
        .nest("/meetings", meetings::meetings_admin_routes())
        .nest("/notes", notes::notes_admin_routes())
        .nest("/redirects", redirects::redirects_admin_routes())
        .nest("/location", location::location_admin_routes())
        .nest("/lesson-icons", lesson_icons::lesson_icons_admin_routes())
        .nest("/audit-log", audit_log::audit_log_routes())
        .nest("/api/dump", backup::backup_routes())
        .with_state(state)
        .route_layer(middleware::from_fn_with_state(guard, AdminGuard::middleware));

    let session = Router::new()
        .route("/logout", post(logout))
        .with_state(logout_state);

    Router::new().nest(&prefix, guarded.merge(session))
}

/// Public read-only API and the short-link redirector
pub fn public_router(pool: PgPool) -> Router {
    Router::new()
        .nest("/api/information", information::information_public_routes())
        .nest("/api/leadership", leadership::leadership_public_routes())
        .nest("/api/meetings", meetings::meetings_public_routes())
        .nest("/api/location", location::location_public_routes())
        .nest("/api/lesson-icons", lesson_icons::lesson_icons_public_routes())
        .nest("/redir", redirects::redir_routes())
        .with_state(pool)
}

async fn console_home(Extension(admin): Extension<AdminIdentity>) -> Response {
    ApiResponse::success(admin).into_response()
}
