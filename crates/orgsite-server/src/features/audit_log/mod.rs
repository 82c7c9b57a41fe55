//! Read-only audit log viewer

pub mod routes;

pub use routes::audit_log_routes;
