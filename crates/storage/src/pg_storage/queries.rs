//! QueryStore implementation for PgStorage.

use async_trait::async_trait;
use dbsage_core::{NewQueryTemplate, QueryTemplate};
use sqlx::Row;

use super::PgStorage;
use crate::error::StorageError;
use crate::traits::QueryStore;

#[async_trait]
impl QueryStore for PgStorage {
    async fn insert_template(&self, template: &NewQueryTemplate) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "INSERT INTO queries (query_name, normalized_template, environment)
             VALUES ($1, $2, $3)
             ON CONFLICT (query_name) DO NOTHING",
        )
        .bind(&template.name)
        .bind(&template.normalized_text)
        .bind(&template.environment)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_template(&self, id: i32) -> Result<Option<QueryTemplate>, StorageError> {
        let row = sqlx::query(
            "SELECT id, query_name, normalized_template, environment FROM queries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(QueryTemplate {
                id: row.try_get("id")?,
                name: row.try_get("query_name")?,
                normalized_text: row.try_get("normalized_template")?,
                environment: row.try_get("environment")?,
            })
        })
        .transpose()
    }

    async fn list_template_ids(&self, environment: &str) -> Result<Vec<i32>, StorageError> {
        Ok(sqlx::query_scalar("SELECT id FROM queries WHERE environment = $1 ORDER BY id")
            .bind(environment)
            .fetch_all(&self.pool)
            .await?)
    }
}
