//! Information routes
//!
//! Admin (nested under `{admin}/information`):
//!
//! - `GET /` - list every block
//! - `POST /new` - create a block
//! - `POST /:id` - update a block
//! - `POST /:id/delete` - delete a block
//!
//! Public: `GET /api/information` lists enabled blocks.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use sqlx::PgPool;

use super::{commands, queries, InformationError, InformationForm};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::AdminState;
use crate::resources::ResourceType;

pub fn information_admin_routes() -> Router<AdminState> {
    Router::new()
        .route("/", get(list_information))
        .route("/new", post(create_information))
        .route("/:id", post(update_information))
        .route("/:id/delete", post(delete_information))
}

pub fn information_public_routes() -> Router<PgPool> {
    Router::new().route("/", get(list_enabled_information))
}

async fn list_information(State(pool): State<PgPool>) -> Result<Response, InformationError> {
    let rows = queries::list_all(&pool).await?;
    Ok(ApiResponse::success(rows).into_response())
}

async fn create_information(
    State(state): State<AdminState>,
    Form(form): Form<InformationForm>,
) -> Result<Response, InformationError> {
    commands::create(&state.db, &form).await?;
    Ok(state.back_to(ResourceType::Information).into_response())
}

async fn update_information(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Form(form): Form<InformationForm>,
) -> Result<Response, InformationError> {
    commands::update(&state.db, &id, &form).await?;
    Ok(state.back_to(ResourceType::Information).into_response())
}

async fn delete_information(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Response, InformationError> {
    commands::delete(&state.db, &id).await?;
    Ok(state.back_to(ResourceType::Information).into_response())
}

async fn list_enabled_information(State(pool): State<PgPool>) -> Result<Response, InformationError> {
    let rows = queries::list_enabled(&pool).await?;
    Ok(ApiResponse::success(rows).into_response())
}

impl IntoResponse for InformationError {
    fn into_response(self) -> Response {
        match self {
            InformationError::MissingFields | InformationError::InvalidSortIndex => {
                ErrorResponse::validation(self.to_string())
            },
            InformationError::NotFound(_) => ErrorResponse::not_found(self.to_string()),
            InformationError::Database(ref e) => {
                tracing::error!(error = %e, "Database error in information routes");
                ErrorResponse::database()
            },
        }
    }
}
