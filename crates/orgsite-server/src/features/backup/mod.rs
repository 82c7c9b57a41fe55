//! JSON export of the site content for off-site backups

pub mod routes;

pub use routes::backup_routes;
