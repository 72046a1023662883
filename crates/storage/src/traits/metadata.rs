use async_trait::async_trait;
use dbsage_core::{ColumnMetadata, SnapshotScope};

use crate::error::StorageError;

/// Persisted schema snapshot.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Create the metadata tables if missing.
    async fn ensure_tables(&self) -> Result<(), StorageError>;

    /// Drop and recreate the metadata tables, destroying all stored
    /// metadata, templates and evidence.
    async fn reset_tables(&self) -> Result<(), StorageError>;

    /// Delete every snapshot row of `scope`. Returns rows removed.
    async fn clear_metadata(&self, scope: &SnapshotScope) -> Result<u64, StorageError>;

    /// Atomically clear `scope` and insert `rows`, skipping key conflicts.
    ///
    /// Returns the number of rows actually inserted.
    async fn replace_snapshot(
        &self,
        scope: &SnapshotScope,
        rows: &[ColumnMetadata],
    ) -> Result<u64, StorageError>;

    /// Snapshot rows of `scope`, ordered by (schema, table, column).
    async fn list_metadata(&self, scope: &SnapshotScope)
    -> Result<Vec<ColumnMetadata>, StorageError>;
}
