//! Leadership routes
//!
//! Admin (nested under `{admin}/leadership`): `GET /`, `POST /new`,
//! `POST /:id`, `POST /:id/delete`.
//!
//! Public: `GET /api/leadership`.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use sqlx::PgPool;

use super::{commands, queries, LeaderForm, LeadershipError};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::AdminState;
use crate::resources::ResourceType;

pub fn leadership_admin_routes() -> Router<AdminState> {
    Router::new()
        .route("/", get(list_leaders))
        .route("/new", post(create_leader))
        .route("/:id", post(update_leader))
        .route("/:id/delete", post(delete_leader))
}

pub fn leadership_public_routes() -> Router<PgPool> {
    Router::new().route("/", get(list_leaders))
}

async fn list_leaders(State(pool): State<PgPool>) -> Result<Response, LeadershipError> {
    let rows = queries::list_all(&pool).await?;
    Ok(ApiResponse::success(rows).into_response())
}

async fn create_leader(
    State(state): State<AdminState>,
    Form(form): Form<LeaderForm>,
) -> Result<Response, LeadershipError> {
    commands::create(&state.db, &form).await?;
    Ok(state.back_to(ResourceType::Leadership).into_response())
}

async fn update_leader(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Form(form): Form<LeaderForm>,
) -> Result<Response, LeadershipError> {
    commands::update(&state.db, &id, &form).await?;
    Ok(state.back_to(ResourceType::Leadership).into_response())
}

async fn delete_leader(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Response, LeadershipError> {
    commands::delete(&state.db, &id).await?;
    Ok(state.back_to(ResourceType::Leadership).into_response())
}

impl IntoResponse for LeadershipError {
    fn into_response(self) -> Response {
        match self {
            LeadershipError::NotFound(_) => ErrorResponse::not_found(self.to_string()),
            LeadershipError::Database(ref e) => {
                tracing::error!(error = %e, "Database error in leadership routes");
                ErrorResponse::database()
            },
            _ => ErrorResponse::validation(self.to_string()),
        }
    }
}
