use std::sync::Arc;

use dbsage_core::{NewQueryTemplate, NormalizeOptions, QueryDefinition, normalize};
use dbsage_storage::QueryStore;
use serde::Serialize;

use crate::ServiceError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    /// Definitions whose name already existed.
    pub skipped: usize,
}

/// Normalizes raw query definitions and stores them as templates.
pub struct QueryIngestor {
    queries: Arc<dyn QueryStore>,
    options: NormalizeOptions,
}

impl QueryIngestor {
    #[must_use]
    pub fn new(queries: Arc<dyn QueryStore>, options: NormalizeOptions) -> Self {
        Self { queries, options }
    }

    pub async fn ingest(
        &self,
        definitions: &[QueryDefinition],
        environment: &str,
    ) -> Result<IngestReport, ServiceError> {
        let mut report = IngestReport::default();
        for definition in definitions {
            if definition.name.trim().is_empty() {
                return Err(ServiceError::InvalidInput("query definition without a name".into()));
            }
            let template = NewQueryTemplate {
                name: definition.name.clone(),
                normalized_text: normalize(&definition.template, &self.options),
                environment: environment.to_owned(),
            };
            if self.queries.insert_template(&template).await? {
                report.inserted += 1;
            } else {
                tracing::debug!(name = %definition.name, "query template already present");
                report.skipped += 1;
            }
        }
        tracing::info!(
            environment,
            inserted = report.inserted,
            skipped = report.skipped,
            "query templates ingested"
        );
        Ok(report)
    }
}
