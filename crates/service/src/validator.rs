use std::sync::Arc;

use dbsage_core::{MAX_QUERY_LIMIT, QueryOutcome};
use dbsage_storage::CatalogStore;

use crate::ServiceError;

/// Two-phase validate-then-execute runner.
///
/// The statement is first planned without execution. Only when the plan-only
/// check passes is it executed for real. Nothing is retried and the SQL text
/// is never altered.
pub struct QueryValidator {
    catalog: Arc<dyn CatalogStore>,
}

impl QueryValidator {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Validate and, when valid, execute `sql`.
    ///
    /// Engine rejections come back as `SyntaxError` or `ExecutionError`
    /// outcomes; `Err` is reserved for infrastructure failures.
    pub async fn run(&self, sql: &str) -> Result<QueryOutcome, ServiceError> {
        if let Err(err) = self.catalog.explain(sql).await {
            return match err.engine_message() {
                Some(error) => {
                    tracing::info!(error = %error, "statement rejected by plan-only check");
                    Ok(QueryOutcome::SyntaxError { sql: sql.to_owned(), error })
                },
                None => Err(err.into()),
            };
        }

        match self.catalog.execute(sql).await {
            Ok(rows) if rows.is_empty() => Ok(QueryOutcome::EmptyResult { sql: sql.to_owned() }),
            Ok(rows) => {
                tracing::debug!(rows = rows.len(), "statement executed");
                Ok(QueryOutcome::Ok { sql: sql.to_owned(), rows })
            },
            Err(err) => match err.engine_message() {
                Some(error) => {
                    tracing::warn!(error = %error, "statement failed after validation");
                    Ok(QueryOutcome::ExecutionError { sql: sql.to_owned(), error })
                },
                None => Err(err.into()),
            },
        }
    }

    /// First `limit` rows of `table`, through the same protocol.
    pub async fn preview_table(
        &self,
        schema: Option<&str>,
        table: &str,
        limit: usize,
    ) -> Result<QueryOutcome, ServiceError> {
        if table.trim().is_empty() {
            return Err(ServiceError::InvalidInput("table name is empty".into()));
        }
        let limit = limit.clamp(1, MAX_QUERY_LIMIT);
        let relation = match schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(table)),
            None => quote_ident(table),
        };
        self.run(&format!("SELECT * FROM {relation} LIMIT {limit}")).await
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
