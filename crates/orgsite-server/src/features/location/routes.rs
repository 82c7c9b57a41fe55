//! Location routes
//!
//! Admin: `GET {admin}/location` and `POST {admin}/location`, which redirects
//! back to the console home. Public: `GET /api/location`.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use sqlx::PgPool;

use super::{commands, LocationError, LocationForm};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::AdminState;

pub fn location_admin_routes() -> Router<AdminState> {
    Router::new().route("/", get(current_location).post(save_location))
}

pub fn location_public_routes() -> Router<PgPool> {
    Router::new().route("/", get(current_location))
}

async fn current_location(State(pool): State<PgPool>) -> Result<Response, LocationError> {
    let location = commands::current(&pool).await?;
    Ok(ApiResponse::success(location).into_response())
}

async fn save_location(
    State(state): State<AdminState>,
    Form(form): Form<LocationForm>,
) -> Result<Response, LocationError> {
    commands::save(&state.db, &form).await?;
    Ok(state.back_to_console().into_response())
}

impl IntoResponse for LocationError {
    fn into_response(self) -> Response {
        match self {
            LocationError::Database(ref e) => {
                tracing::error!(error = %e, "Database error in location routes");
                ErrorResponse::database()
            },
            _ => ErrorResponse::validation(self.to_string()),
        }
    }
}
