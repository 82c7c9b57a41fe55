//! Shared fixtures for the database-backed tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use orgsite_server::{
    api::{create_router, AppState},
    audit::{list_audit_log, AuditLogEntry, AuditLogQuery},
    config::Config,
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

pub const ADMIN_USER_ID: &str = "discord-1234";
pub const ADMIN_USERNAME: &str = "ada";

/// Insert a live admin session and return its cookie value
pub async fn seed_admin_session(pool: &PgPool) -> String {
    let token = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO admin_sessions (id, discord_user_id, discord_username, is_admin, expires_at)
        VALUES ($1, $2, $3, TRUE, NOW() + INTERVAL '1 hour')
        "#,
    )
    .bind(&token)
    .bind(ADMIN_USER_ID)
    .bind(ADMIN_USERNAME)
    .execute(pool)
    .await
    .expect("Failed to seed admin session");
    token
}

/// The full application with default configuration
pub fn app(pool: PgPool) -> Router {
    create_router(AppState {
        db: pool,
        config: Arc::new(Config::default()),
    })
    .expect("Failed to build router")
}

pub fn form_post(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::USER_AGENT, "orgsite-tests/1.0");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("admin_session={token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("admin_session={token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("admin_session={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Wait for the detached audit writes to land, newest entry first
pub async fn audit_entries(pool: &PgPool, expected: usize) -> Vec<AuditLogEntry> {
    for _ in 0..100 {
        let entries = list_audit_log(pool, &AuditLogQuery::default(), 500)
            .await
            .expect("Failed to list audit log");
        if entries.len() >= expected {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Timed out waiting for {expected} audit entries");
}

/// Count entries after giving any stray write time to land
pub async fn settled_audit_count(pool: &PgPool) -> i64 {
    tokio::time::sleep(Duration::from_millis(300)).await;
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_audit_log")
        .fetch_one(pool)
        .await
        .expect("Failed to count audit entries")
}

pub fn changes(text: &Option<String>) -> serde_json::Value {
    text.as_deref()
        .map(|t| serde_json::from_str(t).expect("stored changes should be JSON"))
        .unwrap_or(serde_json::Value::Null)
}
