//! EvidenceStore implementation for PgStorage.

use std::collections::BTreeSet;

use async_trait::async_trait;
use dbsage_core::{AntiPattern, ExecutionEvidence, NewEvidence};
use sqlx::Row;

use super::PgStorage;
use crate::error::StorageError;
use crate::traits::EvidenceStore;

/// Parse stored anti-pattern tags, dropping unknown ones with a warning.
fn parse_pg_anti_patterns(tags: Vec<String>) -> BTreeSet<AntiPattern> {
    tags.into_iter()
        .filter_map(|tag| match tag.parse::<AntiPattern>() {
            Ok(pattern) => Some(pattern),
            Err(_) => {
                tracing::warn!(invalid_tag = %tag, "unknown anti-pattern tag in DB, skipping");
                None
            },
        })
        .collect()
}

#[async_trait]
impl EvidenceStore for PgStorage {
    async fn insert_evidence(&self, evidence: &NewEvidence) -> Result<i32, StorageError> {
        let tags: Vec<&str> = evidence.anti_patterns.iter().map(|p| p.as_str()).collect();
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO execution_evidence (query_id, explain_output, anti_patterns)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(evidence.query_id)
        .bind(serde_json::Value::Array(evidence.explain_output.clone()))
        .bind(tags)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn list_evidence(
        &self,
        environment: &str,
    ) -> Result<Vec<ExecutionEvidence>, StorageError> {
        let rows = sqlx::query(
            "SELECT e.id, e.query_id, e.explain_output, e.anti_patterns
             FROM execution_evidence e
             JOIN queries q ON q.id = e.query_id
             WHERE q.environment = $1
             ORDER BY e.id",
        )
        .bind(environment)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let explain_output: serde_json::Value = row.try_get("explain_output")?;
                Ok(ExecutionEvidence {
                    id: row.try_get("id")?,
                    query_id: row.try_get("query_id")?,
                    explain_output: serde_json::from_value(explain_output)?,
                    anti_patterns: parse_pg_anti_patterns(row.try_get("anti_patterns")?),
                })
            })
            .collect()
    }

    async fn purge_evidence(&self, environment: &str) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "DELETE FROM execution_evidence
             WHERE query_id IN (SELECT id FROM queries WHERE environment = $1)",
        )
        .bind(environment)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
