//! Redirect routes
//!
//! Admin (nested under `{admin}/redirects`):
//!
//! - `GET /` - list every redirect
//! - `POST /new` - create a redirect
//! - `POST /:slug` - update (and possibly rename) a redirect
//! - `POST /:slug/delete` - delete a redirect
//!
//! Public (nested under `/redir`):
//!
//! - `GET /` - list enabled redirects; `?missing=slug` is echoed in `meta`
//! - `GET /:slug` - `307` to the target, or `302` back to the listing

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use super::commands::{self, CreateRedirectError, DeleteRedirectError, UpdateRedirectError};
use super::{queries, RedirectForm};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::auth::guard::found;
use crate::features::AdminState;
use crate::resources::ResourceType;

pub fn redirects_admin_routes() -> Router<AdminState> {
    Router::new()
        .route("/", get(list_redirects))
        .route("/new", post(create_redirect))
        .route("/:slug", post(update_redirect))
        .route("/:slug/delete", post(delete_redirect))
}

pub fn redir_routes() -> Router<PgPool> {
    Router::new()
        .route("/", get(list_enabled_redirects))
        .route("/:slug", get(follow_redirect))
}

// ============================================================================
// Admin handlers
// ============================================================================

async fn list_redirects(State(pool): State<PgPool>) -> Result<Response, RedirectApiError> {
    let rows = queries::list_all(&pool).await?;
    Ok(ApiResponse::success(rows).into_response())
}

async fn create_redirect(
    State(state): State<AdminState>,
    Form(form): Form<RedirectForm>,
) -> Result<Response, RedirectApiError> {
    commands::create::handle(&state.db, &form).await?;
    Ok(state.back_to(ResourceType::Redirects).into_response())
}

async fn update_redirect(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
    Form(form): Form<RedirectForm>,
) -> Result<Response, RedirectApiError> {
    commands::update::handle(&state.db, &slug, &form).await?;
    Ok(state.back_to(ResourceType::Redirects).into_response())
}

async fn delete_redirect(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Result<Response, RedirectApiError> {
    commands::delete::handle(&state.db, &slug).await?;
    Ok(state.back_to(ResourceType::Redirects).into_response())
}

// ============================================================================
// Public handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListingParams {
    missing: Option<String>,
}

async fn list_enabled_redirects(
    State(pool): State<PgPool>,
    Query(params): Query<ListingParams>,
) -> Result<Response, RedirectApiError> {
    let rows = queries::list_enabled(&pool).await?;
    let response = match params.missing {
        Some(missing) => ApiResponse::success_with_meta(rows, json!({ "missing": missing })),
        None => ApiResponse::success(rows),
    };
    Ok(response.into_response())
}

#[tracing::instrument(skip(pool))]
async fn follow_redirect(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
) -> Result<Response, RedirectApiError> {
    let Some(redirect) = queries::find_enabled(&pool, &slug).await? else {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("missing", &slug)
            .finish();
        return Ok(found(&format!("/redir?{query}")));
    };

    if let Err(e) = queries::record_click(&pool, &slug).await {
        tracing::warn!(slug = %slug, error = %e, "Failed to record redirect click");
    }

    // 307 so browsers do not cache the target
    Ok((
        StatusCode::TEMPORARY_REDIRECT,
        [(header::LOCATION, redirect.target_url)],
    )
        .into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for redirect routes
#[derive(Debug, thiserror::Error)]
enum RedirectApiError {
    #[error(transparent)]
    Create(#[from] CreateRedirectError),

    #[error(transparent)]
    Update(#[from] UpdateRedirectError),

    #[error(transparent)]
    Delete(#[from] DeleteRedirectError),

    #[error("Database error: {0}")]
    Query(#[from] sqlx::Error),
}

impl IntoResponse for RedirectApiError {
    fn into_response(self) -> Response {
        match self {
            RedirectApiError::Create(CreateRedirectError::Form(ref e))
            | RedirectApiError::Update(UpdateRedirectError::Form(ref e)) => {
                ErrorResponse::validation(e.to_string())
            },
            RedirectApiError::Create(CreateRedirectError::SlugInUse(_))
            | RedirectApiError::Update(UpdateRedirectError::SlugInUse(_)) => {
                ErrorResponse::validation(self.to_string())
            },
            RedirectApiError::Update(UpdateRedirectError::NotFound(_)) => {
                ErrorResponse::not_found(self.to_string())
            },
            RedirectApiError::Create(CreateRedirectError::Database(ref e))
            | RedirectApiError::Update(UpdateRedirectError::Database(ref e))
            | RedirectApiError::Delete(DeleteRedirectError::Database(ref e))
            | RedirectApiError::Query(ref e) => {
                tracing::error!(error = %e, "Database error in redirect routes");
                ErrorResponse::database()
            },
        }
    }
}
