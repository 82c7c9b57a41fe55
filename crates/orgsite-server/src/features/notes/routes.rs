//! Note routes, nested under `{admin}/notes`

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use sqlx::PgPool;

use super::{commands, NoteError, NoteForm};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::AdminState;
use crate::resources::ResourceType;

pub fn notes_admin_routes() -> Router<AdminState> {
    Router::new()
        .route("/", get(list_notes))
        .route("/new", post(create_note))
        .route("/:id", post(update_note))
        .route("/:id/delete", post(delete_note))
}

async fn list_notes(State(pool): State<PgPool>) -> Result<Response, NoteError> {
    let rows = commands::list_all(&pool).await?;
    Ok(ApiResponse::success(rows).into_response())
}

async fn create_note(
    State(state): State<AdminState>,
    Form(form): Form<NoteForm>,
) -> Result<Response, NoteError> {
    commands::create(&state.db, &form).await?;
    Ok(state.back_to(ResourceType::Notes).into_response())
}

async fn update_note(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Form(form): Form<NoteForm>,
) -> Result<Response, NoteError> {
    commands::update(&state.db, &id, &form).await?;
    Ok(state.back_to(ResourceType::Notes).into_response())
}

async fn delete_note(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Response, NoteError> {
    commands::delete(&state.db, &id).await?;
    Ok(state.back_to(ResourceType::Notes).into_response())
}

impl IntoResponse for NoteError {
    fn into_response(self) -> Response {
        match self {
            NoteError::NotFound(_) => ErrorResponse::not_found(self.to_string()),
            NoteError::Database(ref e) => {
                tracing::error!(error = %e, "Database error in note routes");
                ErrorResponse::database()
            },
            _ => ErrorResponse::validation(self.to_string()),
        }
    }
}
