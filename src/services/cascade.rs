// src/services/cascade.rs
//! Cascading delete workflow
//!
//! Removes a resource's blobs and then its relational row, in that
//! order and never the reverse: the row is the only index into the blob
//! namespace, so "blobs gone, row remains" is recoverable by retry
//! while "row gone, blobs remain" orphans storage forever.
//!
//! One workflow serves both resource kinds; only the storage prefix and
//! the row table differ.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use super::storage::{BlobStore, StorageError};

/// What is being deleted; selects the row table and labels the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Project,
    Track,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::Track => "track",
        }
    }
}

/// Ephemeral, in-request description of one cascading delete. Never
/// persisted; built by the handler and consumed by `CascadeDelete::run`.
#[derive(Debug)]
pub struct DeleteJob {
    pub kind: ResourceKind,
    pub id: i64,
    /// Storage namespace owning every blob of this resource
    /// (`{project_slug}` or `{project_slug}/{track_slug}`).
    pub prefix: String,
}

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("blob listing failed: {0}")]
    Listing(StorageError),

    #[error("bulk blob removal failed: {0}")]
    Removal(StorageError),

    #[error("row deletion failed: {0}")]
    RowDelete(sqlx::Error),
}

/// Row-deletion capability the workflow needs from the data store.
#[async_trait]
pub trait RowDeleter: Send + Sync {
    async fn delete_row(&self, kind: ResourceKind, id: i64) -> Result<u64, sqlx::Error>;
}

pub struct PgRowDeleter {
    db: PgPool,
}

impl PgRowDeleter {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RowDeleter for PgRowDeleter {
    async fn delete_row(&self, kind: ResourceKind, id: i64) -> Result<u64, sqlx::Error> {
        let result = match kind {
            ResourceKind::Project => {
                sqlx::query("DELETE FROM projects WHERE id = $1")
                    .bind(id)
                    .execute(&self.db)
                    .await?
            }
            ResourceKind::Track => {
                sqlx::query("DELETE FROM tracks WHERE id = $1")
                    .bind(id)
                    .execute(&self.db)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }
}

/// The ordered workflow runner.
#[derive(Clone)]
pub struct CascadeDelete {
    storage: Arc<dyn BlobStore>,
    rows: Arc<dyn RowDeleter>,
}

impl CascadeDelete {
    pub fn new(storage: Arc<dyn BlobStore>, rows: Arc<dyn RowDeleter>) -> Self {
        Self { storage, rows }
    }

    /// Runs list → bulk remove → row delete, stopping at the first
    /// failure. Success only when every step succeeded.
    pub async fn run(&self, job: DeleteJob) -> Result<(), CascadeError> {
        info!(
            kind = %job.kind.as_str(),
            id = job.id,
            prefix = %job.prefix,
            "Starting cascading delete"
        );

        // Step 1: listing failure aborts everything; nothing is deleted.
        let listing = self.storage.list(&job.prefix).await.map_err(|e| {
            error!(
                kind = %job.kind.as_str(),
                id = job.id,
                step = "list",
                error = %e,
                "Cascading delete aborted"
            );
            CascadeError::Listing(e)
        })?;

        // Step 2: everything listed goes in one bulk call. On failure
        // the row stays so a retry can re-list and finish the cleanup.
        if !listing.is_empty() {
            let paths: Vec<String> = listing
                .iter()
                .map(|obj| format!("{}/{}", job.prefix, obj.name))
                .collect();

            self.storage.remove_many(&paths).await.map_err(|e| {
                error!(
                    kind = %job.kind.as_str(),
                    id = job.id,
                    step = "remove",
                    count = paths.len(),
                    error = %e,
                    "Cascading delete aborted; row left intact"
                );
                CascadeError::Removal(e)
            })?;

            debug!(
                kind = %job.kind.as_str(),
                id = job.id,
                count = paths.len(),
                "Blobs removed"
            );
        }

        // Step 3: the row goes last. Idempotent on retry.
        let rows_affected = self.rows.delete_row(job.kind, job.id).await.map_err(|e| {
            error!(
                kind = %job.kind.as_str(),
                id = job.id,
                step = "row-delete",
                error = %e,
                "Row deletion failed after blob cleanup"
            );
            CascadeError::RowDelete(e)
        })?;

        info!(
            kind = %job.kind.as_str(),
            id = job.id,
            rows_affected,
            "✅ Cascading delete complete"
        );
        Ok(())
    }
}
