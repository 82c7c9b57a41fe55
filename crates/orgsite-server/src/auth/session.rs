//! Cookie-backed admin sessions

use async_trait::async_trait;
use axum::http::{header::COOKIE, HeaderMap};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::{AdminIdentity, AdminIdentityResolver, AuthError};

/// Row of `admin_sessions`; `id` is the cookie value
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminSession {
    pub id: String,
    pub discord_user_id: String,
    pub discord_username: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<AdminSession> for AdminIdentity {
    fn from(session: AdminSession) -> Self {
        Self { user_id: session.discord_user_id, username: session.discord_username }
    }
}

/// Value of the named cookie, if present and non-empty
pub fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Look up a live admin session
pub async fn find_active_session(pool: &PgPool, token: &str) -> Result<Option<AdminSession>, sqlx::Error> {
    sqlx::query_as::<_, AdminSession>(
        r#"
        SELECT id, discord_user_id, discord_username, is_admin, created_at, expires_at
        FROM admin_sessions
        WHERE id = $1 AND is_admin = TRUE AND expires_at > NOW()
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

/// Delete a session row, returning whether one existed
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM admin_sessions WHERE id = $1")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Resolver reading the session cookie against `admin_sessions`
#[derive(Clone)]
pub struct PgSessionResolver {
    pool: PgPool,
    cookie_name: String,
}

impl PgSessionResolver {
    pub fn new(pool: PgPool, cookie_name: impl Into<String>) -> Self {
        Self { pool, cookie_name: cookie_name.into() }
    }
}

#[async_trait]
impl AdminIdentityResolver for PgSessionResolver {
    async fn current_admin(&self, headers: &HeaderMap) -> Result<Option<AdminIdentity>, AuthError> {
        let Some(token) = session_token(headers, &self.cookie_name) else {
            return Ok(None);
        };

        let session = find_active_session(&self.pool, token).await?;
        if session.is_none() {
            debug!("Session cookie present but no live admin session");
        }

        Ok(session.map(AdminIdentity::from))
    }
}
