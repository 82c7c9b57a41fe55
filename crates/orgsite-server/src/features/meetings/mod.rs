//! Meetings and events

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{MeetingError, MeetingFields, MeetingForm};
pub use routes::{meetings_admin_routes, meetings_public_routes};
