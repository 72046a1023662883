//! Structured results of the validate-then-execute protocol.

use serde::Serialize;

/// One result row keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Terminal state of a query run.
///
/// `SyntaxError` and `OutOfScope` are reached without ever executing the
/// statement. `EmptyResult` is a successful run that matched nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Ok { sql: String, rows: Vec<Row> },
    EmptyResult { sql: String },
    SyntaxError { sql: String, error: String },
    ExecutionError { sql: String, error: String },
    OutOfScope { sql: String, relations: Vec<String> },
}

impl QueryOutcome {
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Ok { .. } => "ok",
            Self::EmptyResult { .. } => "empty_result",
            Self::SyntaxError { .. } => "syntax_error",
            Self::ExecutionError { .. } => "execution_error",
            Self::OutOfScope { .. } => "out_of_scope",
        }
    }

    /// The SQL text this outcome refers to, exactly as submitted.
    #[must_use]
    pub fn sql(&self) -> &str {
        match self {
            Self::Ok { sql, .. }
            | Self::EmptyResult { sql }
            | Self::SyntaxError { sql, .. }
            | Self::ExecutionError { sql, .. }
            | Self::OutOfScope { sql, .. } => sql,
        }
    }

    /// Whether the statement was executed.
    #[must_use]
    pub const fn was_executed(&self) -> bool {
        matches!(self, Self::Ok { .. } | Self::EmptyResult { .. } | Self::ExecutionError { .. })
    }
}
