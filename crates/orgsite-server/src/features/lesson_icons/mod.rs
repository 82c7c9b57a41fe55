//! Icon mappings for lesson categories

pub mod commands;
pub mod routes;

pub use commands::{CreateLessonIconCommand, LessonIconError, UpdateLessonIconCommand};
pub use routes::{lesson_icons_admin_routes, lesson_icons_public_routes};
