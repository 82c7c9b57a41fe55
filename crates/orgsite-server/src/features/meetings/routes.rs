//! Meeting routes
//!
//! Admin (nested under `{admin}/meetings`): `GET /`, `POST /new`, `POST /:id`,
//! `POST /:id/delete`.
//!
//! Public: `GET /api/meetings`.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use sqlx::PgPool;

use super::{commands, queries, MeetingError, MeetingForm};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::AdminState;
use crate::resources::ResourceType;

pub fn meetings_admin_routes() -> Router<AdminState> {
    Router::new()
        .route("/", get(list_meetings))
        .route("/new", post(create_meeting))
        .route("/:id", post(update_meeting))
        .route("/:id/delete", post(delete_meeting))
}

pub fn meetings_public_routes() -> Router<PgPool> {
    Router::new().route("/", get(list_meetings))
}

async fn list_meetings(State(pool): State<PgPool>) -> Result<Response, MeetingError> {
    let rows = queries::list_all(&pool).await?;
    Ok(ApiResponse::success(rows).into_response())
}

async fn create_meeting(
    State(state): State<AdminState>,
    Form(form): Form<MeetingForm>,
) -> Result<Response, MeetingError> {
    commands::create(&state.db, &form).await?;
    Ok(state.back_to(ResourceType::Meetings).into_response())
}

async fn update_meeting(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Form(form): Form<MeetingForm>,
) -> Result<Response, MeetingError> {
    commands::update(&state.db, &id, &form).await?;
    Ok(state.back_to(ResourceType::Meetings).into_response())
}

async fn delete_meeting(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Response, MeetingError> {
    let removed = commands::delete(&state.db, &id).await?;
    if !removed {
        tracing::debug!(id = %id, "Meeting already gone");
    }
    Ok(state.back_to(ResourceType::Meetings).into_response())
}

impl IntoResponse for MeetingError {
    fn into_response(self) -> Response {
        match self {
            MeetingError::MissingFields | MeetingError::InvalidDate => {
                ErrorResponse::validation(self.to_string())
            },
            MeetingError::NotFound(_) => ErrorResponse::not_found(self.to_string()),
            MeetingError::Database(ref e) => {
                tracing::error!(error = %e, "Database error in meeting routes");
                ErrorResponse::database()
            },
        }
    }
}
