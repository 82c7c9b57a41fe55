//! HTTP middleware for the orgsite server
//!
//! - CORS for the public API
//! - Request logging with tracing
//!
//! Admin auditing is its own layer in [`crate::audit`].

use axum::http::{header, Method};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::CorsConfig;

/// Create CORS layer from configuration
///
/// Credentials are only allowed together with an explicit origin list; a
/// wildcard origin never carries cookies.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
            header::CONTENT_LANGUAGE,
            header::CONTENT_TYPE,
        ])
        .max_age(Duration::from_secs(3600));

    if config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<_> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    cors.allow_origin(origins)
        .allow_credentials(config.allow_credentials)
}

/// Create tracing/logging layer
pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Micros),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    fn app(config: &CorsConfig) -> Router {
        Router::new()
            .route("/api/meetings", get(|| async { "[]" }))
            .layer(cors_layer(config))
    }

    async fn allow_origin(config: &CorsConfig, origin: &str) -> Option<String> {
        let response = app(config)
            .oneshot(
                Request::builder()
                    .uri("/api/meetings")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_cors_layer_with_specific_origins() {
        let config = CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: true,
        };

        assert_eq!(
            allow_origin(&config, "http://localhost:5173").await.as_deref(),
            Some("http://localhost:5173")
        );
        assert_eq!(allow_origin(&config, "https://evil.example").await, None);
    }

    #[tokio::test]
    async fn test_cors_layer_with_wildcard_ignores_credentials() {
        let config = CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        };

        assert_eq!(allow_origin(&config, "https://any.example").await.as_deref(), Some("*"));
    }

    #[test]
    fn test_cors_layer_with_empty_origins() {
        let config = CorsConfig {
            allowed_origins: vec![],
            allow_credentials: false,
        };

        let _layer = cors_layer(&config);
    }
}
