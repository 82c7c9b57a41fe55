//! Admin identity
//!
//! Sessions are issued by the Discord login flow elsewhere; this module only
//! looks them up by cookie, guards the admin routes and ends sessions on
//! logout.

pub mod guard;
pub mod session;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Serialize;

pub use guard::AdminGuard;
pub use session::{session_token, AdminSession, PgSessionResolver};

/// The admin performing a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub user_id: String,
    pub username: Option<String>,
}

/// Resolves the current admin from request headers
///
/// Implementations have no side effects, so the audit pipeline may call
/// this once before and once after the handler.
#[async_trait]
pub trait AdminIdentityResolver: Send + Sync {
    async fn current_admin(&self, headers: &HeaderMap) -> Result<Option<AdminIdentity>, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Session lookup failed: {0}")]
    Database(#[from] sqlx::Error),
}
