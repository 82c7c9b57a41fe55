//! Before/after state capture

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::models::{AuditError, Snapshot};
use crate::resources::ResourceType;

/// Looks up a persisted row by its natural key
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn find_by_key(
        &self,
        resource_type: ResourceType,
        key: &str,
    ) -> Result<Option<Snapshot>, AuditError>;
}

/// Fail-closed wrapper around a [`SnapshotSource`]
#[derive(Clone)]
pub struct Snapshotter {
    source: Arc<dyn SnapshotSource>,
}

impl Snapshotter {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self { source }
    }

    /// Snapshot the current row, or `None` when there is no id, no row, or
    /// the lookup failed
    pub async fn snapshot(
        &self,
        resource_type: ResourceType,
        resource_id: Option<&str>,
    ) -> Option<Snapshot> {
        let resource_id = resource_id?;

        match self.source.find_by_key(resource_type, resource_id).await {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                debug!(
                    resource_type = %resource_type,
                    resource_id = %resource_id,
                    "No row to snapshot"
                );
                None
            },
            Err(e) => {
                warn!(
                    resource_type = %resource_type,
                    resource_id = %resource_id,
                    error = %e,
                    "Failed to snapshot resource"
                );
                None
            },
        }
    }
}
