//! Orgsite Server Library
//!
//! Backend for a student organization website: public read-only endpoints,
//! an admin console behind a Discord-issued session, and automatic auditing
//! of every admin mutation.
//!
//! # Overview
//!
//! - **Features**: vertical slices per resource in [`features`]
//! - **Audit**: the two-phase audit layer in [`audit`]
//! - **Auth**: admin session lookup and route guard in [`auth`]
//! - **Resources**: the closed set of resource tables in [`resources`]
//! - **Configuration**: environment-based configuration in [`config`]
//!
//! # Audit Logging
//!
//! Handlers never write audit entries themselves. For each POST/PUT/DELETE
//! under the admin prefix the audit layer records:
//!
//! - Admin user id and username
//! - Action (`CREATE`, `UPDATE`, `DELETE`)
//! - Resource type and id
//! - Row state before and after
//! - Client IP and user agent
//!
//! Entries are read back through `GET {admin}/audit-log`.
//!
//! # Example
//!
//! ```no_run
//! use orgsite_server::{api, config::Config};
//! use sqlx::PgPool;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = PgPool::connect(&config.database.url).await?;
//!     api::serve(config, pool).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod features;
pub mod middleware;
pub mod resources;

// Re-export commonly used types
pub use error::{AppError, ServerResult};
