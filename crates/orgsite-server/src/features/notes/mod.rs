//! Meeting notes

pub mod commands;
pub mod routes;

pub use commands::{NoteError, NoteFields, NoteForm};
pub use routes::notes_admin_routes;
