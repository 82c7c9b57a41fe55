//! Lesson icon routes
//!
//! Admin (nested under `{admin}/lesson-icons`):
//!
//! - `GET /` - list mappings
//! - `POST /api` - create a mapping from JSON `{categoryName, iconifyId}`
//! - `PUT /api/:categoryName` - change the icon from JSON `{iconifyId}`
//! - `POST /:categoryName/delete` - delete a mapping
//!
//! Public: `GET /api/lesson-icons` returns `{category: iconifyId}`.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::commands::{self, CreateLessonIconCommand, LessonIconError, UpdateLessonIconCommand};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::AdminState;
use crate::resources::ResourceType;

pub fn lesson_icons_admin_routes() -> Router<AdminState> {
    Router::new()
        .route("/", get(list_icons))
        .route("/api", post(create_icon))
        .route("/api/:category_name", put(update_icon))
        .route("/:category_name/delete", post(delete_icon))
}

pub fn lesson_icons_public_routes() -> Router<PgPool> {
    Router::new().route("/", get(icon_map))
}

async fn list_icons(State(pool): State<PgPool>) -> Result<Response, LessonIconError> {
    let rows = commands::list_all(&pool).await?;
    Ok(ApiResponse::success(rows).into_response())
}

async fn create_icon(
    State(pool): State<PgPool>,
    Json(command): Json<CreateLessonIconCommand>,
) -> Result<Response, LessonIconError> {
    commands::create(&pool, &command).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

async fn update_icon(
    State(pool): State<PgPool>,
    Path(category_name): Path<String>,
    Json(command): Json<UpdateLessonIconCommand>,
) -> Result<Response, LessonIconError> {
    commands::update(&pool, &category_name, &command).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

async fn delete_icon(
    State(state): State<AdminState>,
    Path(category_name): Path<String>,
) -> Result<Response, LessonIconError> {
    commands::delete(&state.db, &category_name).await?;
    Ok(state.back_to(ResourceType::LessonIcons).into_response())
}

async fn icon_map(State(pool): State<PgPool>) -> Result<Response, LessonIconError> {
    let icons = commands::list_all(&pool).await?;
    Ok(Json(commands::icon_map(icons)).into_response())
}

impl IntoResponse for LessonIconError {
    fn into_response(self) -> Response {
        match self {
            LessonIconError::NotFound(_) => ErrorResponse::not_found(self.to_string()),
            LessonIconError::Database(ref e) => {
                tracing::error!(error = %e, "Database error in lesson icon routes");
                ErrorResponse::database()
            },
            _ => ErrorResponse::validation(self.to_string()),
        }
    }
}
