use async_trait::async_trait;
use dbsage_core::{LiveColumn, Row};

use crate::error::StorageError;

/// The live relational catalog and arbitrary statement execution.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every column of every non-system schema, ordered by schema, table and
    /// ordinal position.
    async fn introspect_columns(&self) -> Result<Vec<LiveColumn>, StorageError>;

    /// First schema (alphabetically) containing a table named `table`.
    async fn find_table_schema(&self, table: &str) -> Result<Option<String>, StorageError>;

    /// Plan-only check of `sql`. Returns one JSON value per plan line.
    async fn explain(&self, sql: &str) -> Result<Vec<serde_json::Value>, StorageError>;

    /// Plan-only check of `sql` with unqualified names resolved in `schema`.
    ///
    /// The search path applies to this call only.
    async fn explain_in_schema(
        &self,
        schema: &str,
        sql: &str,
    ) -> Result<Vec<serde_json::Value>, StorageError>;

    /// Execute `sql` and return its rows rendered as JSON objects.
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, StorageError>;
}
