//! Audit sink: where finished entries go

use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{AuditError, AuditLogEntry, NewAuditLogEntry};
use super::queries::create_audit_entry;

/// Persists audit entries. Entries are append-only.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, AuditError>;
}

/// Sink writing to `admin_audit_log`
#[derive(Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditStore {
    async fn record(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, AuditError> {
        create_audit_entry(&self.pool, &entry).await
    }
}
