//! CatalogStore implementation for PgStorage: live introspection, plan-only
//! checks and statement execution.

use async_trait::async_trait;
use dbsage_core::{LiveColumn, Row, SYSTEM_SCHEMAS};
use sqlx::Row as _;
use sqlx::postgres::PgRow;

use super::{PgStorage, quote_ident};
use crate::error::StorageError;
use crate::row_render::render_row;
use crate::traits::CatalogStore;

fn plan_rows(rows: &[PgRow]) -> Result<Vec<serde_json::Value>, StorageError> {
    rows.iter()
        .map(|row| {
            let line: String = row.try_get(0)?;
            Ok(serde_json::json!({ "QUERY PLAN": line }))
        })
        .collect()
}

impl PgStorage {
    /// `EXPLAIN` inside a read-only transaction that is always rolled back.
    ///
    /// Input such as `ANALYZE DELETE ...` turns the check into
    /// `EXPLAIN ANALYZE`, which would run the statement; read-only mode makes
    /// the engine reject any write, and the rollback discards everything else.
    async fn plan_only(
        &self,
        schema: Option<&str>,
        sql: &str,
    ) -> Result<Vec<serde_json::Value>, StorageError> {
        // Extended protocol: a multi-statement string is rejected here.
        let statement = format!("EXPLAIN {sql}");
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY").execute(&mut *tx).await?;
        if let Some(schema) = schema {
            sqlx::query("SELECT set_config('search_path', $1, true)")
                .bind(quote_ident(schema))
                .execute(&mut *tx)
                .await?;
        }
        let rows = sqlx::query(&statement).persistent(false).fetch_all(&mut *tx).await;
        tx.rollback().await?;
        plan_rows(&rows?)
    }
}

#[async_trait]
impl CatalogStore for PgStorage {
    async fn introspect_columns(&self) -> Result<Vec<LiveColumn>, StorageError> {
        let rows = sqlx::query(
            "SELECT table_schema::text AS table_schema,
                    table_name::text AS table_name,
                    column_name::text AS column_name,
                    data_type::text AS data_type,
                    (is_nullable = 'YES') AS nullable,
                    column_default::text AS column_default
             FROM information_schema.columns
             WHERE table_schema::text <> ALL($1)
             ORDER BY table_schema, table_name, ordinal_position",
        )
        .bind(SYSTEM_SCHEMAS)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(LiveColumn {
                    schema: row.try_get("table_schema")?,
                    table: row.try_get("table_name")?,
                    column: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    nullable: row.try_get("nullable")?,
                    default: row.try_get("column_default")?,
                })
            })
            .collect()
    }

    async fn find_table_schema(&self, table: &str) -> Result<Option<String>, StorageError> {
        Ok(sqlx::query_scalar(
            "SELECT table_schema::text
             FROM information_schema.tables
             WHERE table_name = $1 AND table_schema::text <> ALL($2)
             ORDER BY table_schema
             LIMIT 1",
        )
        .bind(table)
        .bind(SYSTEM_SCHEMAS)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn explain(&self, sql: &str) -> Result<Vec<serde_json::Value>, StorageError> {
        self.plan_only(None, sql).await
    }

    async fn explain_in_schema(
        &self,
        schema: &str,
        sql: &str,
    ) -> Result<Vec<serde_json::Value>, StorageError> {
        self.plan_only(Some(schema), sql).await
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, StorageError> {
        // Simple protocol: every value arrives in text form.
        let rows = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        rows.iter().map(render_row).collect()
    }
}
