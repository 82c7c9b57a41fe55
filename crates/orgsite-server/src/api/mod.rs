pub mod response;

use crate::audit::{AuditLayer, AuditState, PgAuditStore};
use crate::auth::guard::LogoutState;
use crate::auth::{AdminGuard, PgSessionResolver};
use crate::config::Config;
use crate::features::{self, AdminState};
use crate::middleware;
use crate::resources::PgResourceStore;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tokio_util::task::TaskTracker;
use tower_http::compression::CompressionLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

/// Bind, serve until a shutdown signal arrives, then drain
pub async fn serve(config: Config, db: PgPool) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let shutdown_timeout = config.server.shutdown_timeout_secs;

    let (app, audit_tasks) = build_app(AppState {
        db,
        config: Arc::new(config),
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drain_audit_writes(&audit_tasks, Duration::from_secs(shutdown_timeout)).await;

    info!("Server shut down gracefully");
    Ok(())
}

/// Wait for detached audit writes still in flight once requests have stopped
async fn drain_audit_writes(tasks: &TaskTracker, timeout: Duration) {
    tasks.close();
    if tasks.is_empty() {
        return;
    }

    info!(pending = tasks.len(), "Waiting for audit writes to finish");
    if tokio::time::timeout(timeout, tasks.wait()).await.is_err() {
        warn!(pending = tasks.len(), "Audit writes still pending at shutdown");
    }
}

/// Full application: public API, admin console, then the layer stack with
/// the audit layer outermost so it sees every request first
pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    build_app(state).map(|(router, _)| router)
}

/// [`create_router`] plus the tracker of the audit layer's background writes
pub fn build_app(state: AppState) -> anyhow::Result<(Router, TaskTracker)> {
    let config = &state.config;
    let resolver = Arc::new(PgSessionResolver::new(
        state.db.clone(),
        config.admin.session_cookie.clone(),
    ));

    let audit = AuditLayer::new(AuditState::new(
        config.audit_settings(),
        Arc::new(PgResourceStore::new(state.db.clone())),
        Arc::new(PgAuditStore::new(state.db.clone())),
        resolver.clone(),
    )?);
    let audit_tasks = audit.tasks();

    let admin = features::admin_router(
        AdminState::new(state.db.clone(), &config.admin.path_prefix, config.audit.viewer_limit),
        AdminGuard::new(resolver, config.admin.login_path.clone()),
        LogoutState {
            pool: state.db.clone(),
            cookie_name: config.admin.session_cookie.clone(),
        },
    );

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state.clone())
        .merge(features::public_router(state.db.clone()))
        .merge(admin)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&state.config.cors))
        .layer(audit);

    Ok((router, audit_tasks))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "orgsite",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Reports database connectivity
async fn health(State(state): State<AppState>) -> Response {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": "unreachable"
                })),
            )
                .into_response()
        },
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_waits_for_tracked_writes() {
        let tasks = TaskTracker::new();
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        tasks.spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(());
        });

        drain_audit_writes(&tasks, Duration::from_secs(5)).await;

        assert!(tasks.is_closed());
        assert!(tasks.is_empty());
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_timeout() {
        let tasks = TaskTracker::new();
        tasks.spawn(std::future::pending::<()>());

        drain_audit_writes(&tasks, Duration::from_millis(20)).await;

        assert_eq!(tasks.len(), 1);
    }
}
