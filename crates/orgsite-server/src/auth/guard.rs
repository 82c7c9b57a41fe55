//! Admin route guard and logout

use axum::{
    extract::{Request, State},
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{session, AdminIdentity, AdminIdentityResolver};

/// Redirects requests without a live admin session to the login page
///
/// Apply with `axum::middleware::from_fn_with_state(guard, AdminGuard::middleware)`.
/// On success the resolved [`AdminIdentity`] is placed in the request
/// extensions for handlers that want it.
#[derive(Clone)]
pub struct AdminGuard {
    resolver: Arc<dyn AdminIdentityResolver>,
    login_path: String,
}

impl AdminGuard {
    pub fn new(resolver: Arc<dyn AdminIdentityResolver>, login_path: impl Into<String>) -> Self {
        Self { resolver, login_path: login_path.into() }
    }

    pub async fn middleware(State(guard): State<Self>, mut request: Request, next: Next) -> Response {
        match guard.resolver.current_admin(request.headers()).await {
            Ok(Some(admin)) => {
                request.extensions_mut().insert(admin);
                next.run(request).await
            },
            Ok(None) => found(&guard.login_path),
            Err(e) => {
                warn!(error = %e, "Admin session lookup failed, treating as signed out");
                found(&guard.login_path)
            },
        }
    }
}

/// `302 Found` to `location`
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// State for the logout route
#[derive(Clone)]
pub struct LogoutState {
    pub pool: PgPool,
    pub cookie_name: String,
}

/// `POST {admin}/logout`: drop the session row and clear the cookie
pub async fn logout(State(state): State<LogoutState>, headers: HeaderMap) -> Response {
    if let Some(token) = session::session_token(&headers, &state.cookie_name) {
        match session::delete_session(&state.pool, token).await {
            Ok(true) => info!("Admin session ended"),
            Ok(false) => {},
            Err(e) => error!(error = %e, "Failed to delete admin session"),
        }
    }

    let mut response = found("/");
    let cookie = format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", state.cookie_name);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

impl AdminIdentity {
    /// Identity placed in the extensions by [`AdminGuard`], if any
    pub fn from_request(request: &Request) -> Option<&AdminIdentity> {
        request.extensions().get::<AdminIdentity>()
    }
}
