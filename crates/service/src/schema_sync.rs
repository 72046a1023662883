use std::collections::BTreeSet;
use std::sync::Arc;

use dbsage_core::{ColumnMetadata, SnapshotScope};
use dbsage_storage::{CatalogStore, MetadataStore};
use serde::Serialize;

use crate::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub environment: String,
    pub tables: usize,
    pub columns: usize,
    pub inserted: u64,
}

/// Rebuilds the persisted schema snapshot from live introspection.
pub struct SchemaSync {
    metadata: Arc<dyn MetadataStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl SchemaSync {
    #[must_use]
    pub fn new(metadata: Arc<dyn MetadataStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { metadata, catalog }
    }

    /// Replace every snapshot row of `scope` with the live column set.
    ///
    /// Any failure aborts the run; the snapshot is replaced atomically, so a
    /// failed run leaves the previous snapshot in place.
    pub async fn sync(&self, scope: &SnapshotScope) -> Result<SyncReport, ServiceError> {
        let live = self.catalog.introspect_columns().await?;
        let rows: Vec<ColumnMetadata> =
            live.into_iter().map(|column| ColumnMetadata::from_live(scope, column)).collect();
        let tables: BTreeSet<(&str, &str)> =
            rows.iter().map(|r| (r.schema.as_str(), r.table.as_str())).collect();

        let inserted = self.metadata.replace_snapshot(scope, &rows).await?;
        let report = SyncReport {
            environment: scope.environment.clone(),
            tables: tables.len(),
            columns: rows.len(),
            inserted,
        };
        tracing::info!(
            environment = %report.environment,
            tables = report.tables,
            columns = report.columns,
            inserted = report.inserted,
            "schema snapshot synchronized"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeCatalog, MemoryStore, live_column};

    fn scope() -> SnapshotScope {
        SnapshotScope::new("eGP", "egp_db", "dev")
    }

    #[tokio::test]
    async fn test_sync_matches_live_schema() {
        let store = Arc::new(MemoryStore::default());
        let catalog = Arc::new(FakeCatalog::with_columns(vec![
            live_column("public", "items", "id", true),
            live_column("public", "items", "name", false),
        ]));
        let sync = SchemaSync::new(store.clone(), catalog);

        let report = sync.sync(&scope()).await.unwrap();
        assert_eq!(report.tables, 1);
        assert_eq!(report.columns, 2);
        assert_eq!(report.inserted, 2);

        let rows = store.list_metadata(&scope()).await.unwrap();
        assert_eq!(rows.len(), 2);
        let id = rows.iter().find(|r| r.column == "id").unwrap();
        let name = rows.iter().find(|r| r.column == "name").unwrap();
        assert!(id.nullable);
        assert!(!name.nullable);
    }

    #[tokio::test]
    async fn test_resync_leaves_no_stale_rows() {
        let store = Arc::new(MemoryStore::default());
        let catalog = Arc::new(FakeCatalog::with_columns(vec![
            live_column("public", "items", "id", true),
            live_column("public", "legacy", "x", true),
        ]));
        let sync = SchemaSync::new(store.clone(), catalog.clone());
        sync.sync(&scope()).await.unwrap();

        catalog.set_columns(vec![live_column("public", "items", "id", true)]);
        sync.sync(&scope()).await.unwrap();

        let rows = store.list_metadata(&scope()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].table, "items");
    }

    #[tokio::test]
    async fn test_resync_is_stable() {
        let store = Arc::new(MemoryStore::default());
        let catalog = Arc::new(FakeCatalog::with_columns(vec![
            live_column("s", "b", "y", true),
            live_column("s", "a", "x", false),
        ]));
        let sync = SchemaSync::new(store.clone(), catalog);

        sync.sync(&scope()).await.unwrap();
        let first = serde_json::to_string(&store.list_metadata(&scope()).await.unwrap()).unwrap();
        sync.sync(&scope()).await.unwrap();
        let second = serde_json::to_string(&store.list_metadata(&scope()).await.unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_introspection_failure_is_fatal() {
        let store = Arc::new(MemoryStore::default());
        let catalog = Arc::new(FakeCatalog::unreachable());
        let sync = SchemaSync::new(store.clone(), catalog);
        assert!(sync.sync(&scope()).await.is_err());
    }
}
