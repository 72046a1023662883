//! MetadataStore implementation for PgStorage.

use async_trait::async_trait;
use dbsage_core::{ColumnMetadata, SnapshotScope};
use sqlx::Row;

use super::PgStorage;
use crate::error::StorageError;
use crate::pg_migrations::{reset_pg_tables, run_pg_migrations};
use crate::traits::MetadataStore;

#[async_trait]
impl MetadataStore for PgStorage {
    async fn ensure_tables(&self) -> Result<(), StorageError> {
        run_pg_migrations(&self.pool).await.map_err(|e| StorageError::Migration(e.to_string()))
    }

    async fn reset_tables(&self) -> Result<(), StorageError> {
        reset_pg_tables(&self.pool).await.map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::warn!("metadata tables dropped and recreated");
        Ok(())
    }

    async fn clear_metadata(&self, scope: &SnapshotScope) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "DELETE FROM tables_metadata
             WHERE project_name = $1 AND database_name = $2 AND environment = $3",
        )
        .bind(&scope.project)
        .bind(&scope.database)
        .bind(&scope.environment)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn replace_snapshot(
        &self,
        scope: &SnapshotScope,
        rows: &[ColumnMetadata],
    ) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await?;

        let cleared = sqlx::query(
            "DELETE FROM tables_metadata
             WHERE project_name = $1 AND database_name = $2 AND environment = $3",
        )
        .bind(&scope.project)
        .bind(&scope.database)
        .bind(&scope.environment)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let mut inserted = 0u64;
        for row in rows {
            let result = sqlx::query(
                "INSERT INTO tables_metadata
                    (project_name, database_name, environment, table_schema, table_name,
                     column_name, data_type, nullable, default_value)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 ON CONFLICT (project_name, database_name, environment, table_schema,
                              table_name, column_name) DO NOTHING",
            )
            .bind(&row.project)
            .bind(&row.database)
            .bind(&row.environment)
            .bind(&row.schema)
            .bind(&row.table)
            .bind(&row.column)
            .bind(&row.data_type)
            .bind(row.nullable)
            .bind(&row.default)
            .execute(&mut *tx)
            .await?;
            inserted = inserted.saturating_add(result.rows_affected());
        }

        tx.commit().await?;
        tracing::debug!(
            environment = %scope.environment,
            cleared,
            inserted,
            "metadata snapshot replaced"
        );
        Ok(inserted)
    }

    async fn list_metadata(
        &self,
        scope: &SnapshotScope,
    ) -> Result<Vec<ColumnMetadata>, StorageError> {
        let rows = sqlx::query(
            "SELECT project_name, database_name, environment, table_schema, table_name,
                    column_name, data_type, nullable, default_value
             FROM tables_metadata
             WHERE project_name = $1 AND database_name = $2 AND environment = $3
             ORDER BY table_schema, table_name, column_name",
        )
        .bind(&scope.project)
        .bind(&scope.database)
        .bind(&scope.environment)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ColumnMetadata {
                    project: row.try_get("project_name")?,
                    database: row.try_get("database_name")?,
                    environment: row.try_get("environment")?,
                    schema: row.try_get("table_schema")?,
                    table: row.try_get("table_name")?,
                    column: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    nullable: row.try_get("nullable")?,
                    default: row.try_get("default_value")?,
                })
            })
            .collect()
    }
}
