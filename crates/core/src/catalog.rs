//! Catalog, template and evidence records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::AntiPattern;

/// One column as reported by live catalog introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveColumn {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

impl LiveColumn {
    /// `schema.table.column`, the form used in the grounding context.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.schema, self.table, self.column)
    }
}

/// The (project, database, environment) prefix every snapshot row carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotScope {
    pub project: String,
    pub database: String,
    pub environment: String,
}

impl SnapshotScope {
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        database: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self { project: project.into(), database: database.into(), environment: environment.into() }
    }
}

/// A persisted metadata row. Unique on
/// (project, database, environment, schema, table, column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub project: String,
    pub database: String,
    pub environment: String,
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

impl ColumnMetadata {
    #[must_use]
    pub fn from_live(scope: &SnapshotScope, column: LiveColumn) -> Self {
        Self {
            project: scope.project.clone(),
            database: scope.database.clone(),
            environment: scope.environment.clone(),
            schema: column.schema,
            table: column.table,
            column: column.column,
            data_type: column.data_type,
            nullable: column.nullable,
            default: column.default,
        }
    }

    /// Uniqueness key of the row.
    #[must_use]
    pub fn key(&self) -> (&str, &str, &str, &str, &str, &str) {
        (
            &self.project,
            &self.database,
            &self.environment,
            &self.schema,
            &self.table,
            &self.column,
        )
    }

    /// Text rendered into the vector index for this column.
    #[must_use]
    pub fn chunk_text(&self) -> String {
        format!(
            "Table: {}.{}\nColumn: {}\nData Type: {}\nNullable: {}\nDefault: {}",
            self.schema,
            self.table,
            self.column,
            self.data_type,
            self.nullable,
            self.default.as_deref().unwrap_or("None"),
        )
    }
}

/// A raw query definition as supplied for ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefinition {
    pub name: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQueryTemplate {
    pub name: String,
    pub normalized_text: String,
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub id: i32,
    pub name: String,
    pub normalized_text: String,
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvidence {
    pub query_id: i32,
    pub explain_output: Vec<serde_json::Value>,
    pub anti_patterns: BTreeSet<AntiPattern>,
}

/// Stored plan output plus detected anti-patterns for one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvidence {
    pub id: i32,
    pub query_id: i32,
    pub explain_output: Vec<serde_json::Value>,
    pub anti_patterns: BTreeSet<AntiPattern>,
}

impl ExecutionEvidence {
    /// Structured text rendered into the vector index for this record.
    #[must_use]
    pub fn chunk_text(&self) -> String {
        serde_json::json!({
            "id": self.id,
            "query_id": self.query_id,
            "explain_output": self.explain_output,
            "anti_patterns": self.anti_patterns,
        })
        .to_string()
    }
}
