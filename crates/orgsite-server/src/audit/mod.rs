//! Automatic audit logging for admin mutations
//!
//! Route handlers know nothing about auditing. [`AuditLayer`] wraps the
//! application and, for every POST/PUT/DELETE under the admin prefix made by
//! a signed-in admin:
//!
//! 1. resolves the resource from the path ([`router`]) and the action from
//!    the method and path shape ([`classifier`]),
//! 2. snapshots the row before the handler runs, or captures the payload for
//!    a create ([`snapshot`], [`body`]),
//! 3. lets the handler run untouched,
//! 4. captures the after state and writes one `admin_audit_log` entry in a
//!    detached task.
//!
//! Audit failures are logged and swallowed; they never change a response.
//!
//! # Usage
//!
//! ```no_run
//! use axum::Router;
//! use orgsite_server::audit::{AuditLayer, AuditSettings, AuditState, PgAuditStore};
//! use orgsite_server::auth::PgSessionResolver;
//! use orgsite_server::resources::PgResourceStore;
//! use sqlx::PgPool;
//! use std::sync::Arc;
//!
//! # fn example(pool: PgPool) -> Result<(), regex::Error> {
//! let state = AuditState::new(
//!     AuditSettings::default(),
//!     Arc::new(PgResourceStore::new(pool.clone())),
//!     Arc::new(PgAuditStore::new(pool.clone())),
//!     Arc::new(PgSessionResolver::new(pool, "admin_session")),
//! )?;
//!
//! let app: Router = Router::new().layer(AuditLayer::new(state));
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod classifier;
mod models;
mod pipeline;
mod queries;
pub mod router;
pub mod snapshot;
mod store;

#[cfg(test)]
mod pipeline_tests;

pub use classifier::classify;
pub use models::{
    AuditAction, AuditContext, AuditError, AuditLogEntry, AuditLogQuery, AuditLogView, AuditMapping,
    CapturedState, NewAuditLogEntry, NewAuditLogEntryBuilder, Snapshot, DEFAULT_AUDIT_QUERY_LIMIT,
    MAX_AUDIT_QUERY_LIMIT,
};
pub use pipeline::{AuditLayer, AuditMiddleware, AuditSettings, AuditState, RequestMeta};
pub use queries::{create_audit_entry, get_resource_trail, list_audit_log};
pub use router::{IdSource, ResourceMapping, ResourceRouter};
pub use snapshot::{SnapshotSource, Snapshotter};
pub use store::{AuditSink, PgAuditStore};
