//! Orgsite Server - Main entry point

use anyhow::{Context, Result};
use orgsite_common::logging::{init_logging, LogConfig};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;

use orgsite_server::{api, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("orgsite-server".to_string())
        .filter_directives("orgsite_server=debug,tower_http=debug,sqlx=warn".to_string())
        .build()
        // Environment variables take precedence
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting orgsite server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        admin_prefix = %config.admin.path_prefix,
        "Configuration loaded"
    );

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to the content database")?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .context("Failed to apply content and audit schema migrations")?;

    info!(max_connections = config.database.max_connections, "Database ready");

    if !config.audit.enabled {
        tracing::warn!("Admin audit logging is disabled (AUDIT_ENABLED=false)");
    }

    api::serve(config, db_pool).await
}
