//! Configuration management

use serde::{Deserialize, Serialize};

use crate::audit::{AuditSettings, DEFAULT_AUDIT_QUERY_LIMIT, MAX_AUDIT_QUERY_LIMIT};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/orgsite";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:5173";

// ============================================================================
// Admin / Audit Constants
// ============================================================================

/// Path prefix of the admin console.
pub const DEFAULT_ADMIN_PATH_PREFIX: &str = "/admin";

/// Name of the admin session cookie.
pub const DEFAULT_ADMIN_SESSION_COOKIE: &str = "admin_session";

/// Where signed-out visitors to the admin console are sent.
pub const DEFAULT_ADMIN_LOGIN_PATH: &str = "/auth/discord";

/// Largest request body the audit layer buffers (10 MiB).
pub const DEFAULT_AUDIT_MAX_CAPTURE_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub admin: AdminConfig,
    pub audit: AuditConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Admin console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub path_prefix: String,
    pub session_cookie: String,
    pub login_path: String,
}

/// Audit pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub enabled: bool,
    pub max_capture_bytes: usize,
    /// Entries returned by the viewer when no limit is given
    pub viewer_limit: i64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("ORGSITE_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("ORGSITE_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "ORGSITE_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT", DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            admin: AdminConfig {
                path_prefix: std::env::var("ADMIN_PATH_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_PATH_PREFIX.to_string()),
                session_cookie: std::env::var("ADMIN_SESSION_COOKIE")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_SESSION_COOKIE.to_string()),
                login_path: std::env::var("ADMIN_LOGIN_PATH")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_LOGIN_PATH.to_string()),
            },
            audit: AuditConfig {
                enabled: env_or("AUDIT_ENABLED", true),
                max_capture_bytes: env_or("AUDIT_MAX_CAPTURE_BYTES", DEFAULT_AUDIT_MAX_CAPTURE_BYTES),
                viewer_limit: env_or("AUDIT_VIEWER_LIMIT", DEFAULT_AUDIT_QUERY_LIMIT),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        // Validate port
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        // Validate database URL
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        // Validate connection pool settings
        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        let prefix = &self.admin.path_prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            anyhow::bail!(
                "Admin path prefix must start with '/' and have no trailing slash, got '{}'",
                prefix
            );
        }

        if self.admin.session_cookie.is_empty() {
            anyhow::bail!("Admin session cookie name cannot be empty");
        }

        if self.audit.max_capture_bytes == 0 {
            anyhow::bail!("Audit max_capture_bytes must be greater than 0");
        }

        if !(1..=MAX_AUDIT_QUERY_LIMIT).contains(&self.audit.viewer_limit) {
            anyhow::bail!(
                "Audit viewer limit must be between 1 and {}, got {}",
                MAX_AUDIT_QUERY_LIMIT,
                self.audit.viewer_limit
            );
        }

        // Validate CORS origins
        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }

    /// Settings handed to the audit layer
    pub fn audit_settings(&self) -> AuditSettings {
        AuditSettings {
            enabled: self.audit.enabled,
            admin_prefix: self.admin.path_prefix.clone(),
            max_capture_bytes: self.audit.max_capture_bytes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            admin: AdminConfig {
                path_prefix: DEFAULT_ADMIN_PATH_PREFIX.to_string(),
                session_cookie: DEFAULT_ADMIN_SESSION_COOKIE.to_string(),
                login_path: DEFAULT_ADMIN_LOGIN_PATH.to_string(),
            },
            audit: AuditConfig {
                enabled: true,
                max_capture_bytes: DEFAULT_AUDIT_MAX_CAPTURE_BYTES,
                viewer_limit: DEFAULT_AUDIT_QUERY_LIMIT,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.admin.path_prefix, "/admin");
        assert_eq!(config.audit.viewer_limit, 500);
    }

    #[test]
    fn test_admin_prefix_validation() {
        for prefix in ["admin", "/admin/", "/", ""] {
            let mut config = Config::default();
            config.admin.path_prefix = prefix.to_string();
            assert!(config.validate().is_err(), "prefix {:?} should be rejected", prefix);
        }
    }

    #[test]
    fn test_pool_bounds_validation() {
        let mut config = Config::default();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_audit_limits_validation() {
        let mut config = Config::default();
        config.audit.max_capture_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.audit.viewer_limit = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_audit_settings_follow_config() {
        let mut config = Config::default();
        config.admin.path_prefix = "/console".to_string();
        config.audit.enabled = false;

        let settings = config.audit_settings();
        assert_eq!(settings.admin_prefix, "/console");
        assert!(!settings.enabled);
        assert_eq!(settings.max_capture_bytes, DEFAULT_AUDIT_MAX_CAPTURE_BYTES);
    }
}
