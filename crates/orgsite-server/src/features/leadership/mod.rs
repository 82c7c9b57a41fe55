//! Leadership team roster

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{GradTerm, LeaderFields, LeaderForm, LeadershipError};
pub use routes::{leadership_admin_routes, leadership_public_routes};
