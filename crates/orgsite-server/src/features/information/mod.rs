//! Information blocks shown on the public info page

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{InformationError, InformationFields, InformationForm};
pub use routes::{information_admin_routes, information_public_routes};
