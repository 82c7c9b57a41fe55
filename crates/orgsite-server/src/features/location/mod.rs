//! Meeting location (a single `current` row)

pub mod commands;
pub mod routes;

pub use commands::{Building, LocationError, LocationFields, LocationForm};
pub use routes::{location_admin_routes, location_public_routes};
