use std::collections::BTreeSet;
use std::sync::Arc;

use dbsage_core::{
    AntiPattern, EvidenceConfig, NewEvidence, detect_anti_patterns, substitute_placeholders,
};
use dbsage_storage::{CatalogStore, EvidenceStore, QueryStore};
use serde::Serialize;

use crate::ServiceError;

/// What happened to a single template during evidence collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvidenceOutcome {
    Recorded { evidence_id: i32, anti_patterns: BTreeSet<AntiPattern> },
    /// No schema contains the anchor table; nothing was planned.
    AnchorMissing { anchor_table: String },
    TemplateMissing,
    /// The engine refused to plan the substituted template.
    PlanFailed { error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub recorded: usize,
    pub anchor_missing: usize,
    pub template_missing: usize,
    pub plan_failed: usize,
    /// Items aborted by an infrastructure error (connection, storage).
    pub failed: usize,
}

/// Plans stored templates against the active application schema and records
/// the plan plus its anti-pattern tags.
pub struct EvidenceCollector {
    queries: Arc<dyn QueryStore>,
    evidence: Arc<dyn EvidenceStore>,
    catalog: Arc<dyn CatalogStore>,
    config: EvidenceConfig,
}

impl EvidenceCollector {
    #[must_use]
    pub fn new(
        queries: Arc<dyn QueryStore>,
        evidence: Arc<dyn EvidenceStore>,
        catalog: Arc<dyn CatalogStore>,
        config: EvidenceConfig,
    ) -> Self {
        Self { queries, evidence, catalog, config }
    }

    /// Collect evidence for one template.
    ///
    /// Lookup misses and plan rejections are outcomes; only infrastructure
    /// failures are `Err`.
    pub async fn collect(
        &self,
        query_id: i32,
        environment: &str,
    ) -> Result<EvidenceOutcome, ServiceError> {
        let anchor = &self.config.anchor_table;
        let Some(schema) = self.catalog.find_table_schema(anchor).await? else {
            tracing::warn!(query_id, environment, anchor_table = %anchor, "anchor table not found, skipping");
            return Ok(EvidenceOutcome::AnchorMissing { anchor_table: anchor.clone() });
        };

        let Some(template) = self.queries.get_template(query_id).await? else {
            tracing::debug!(query_id, "no template with this id");
            return Ok(EvidenceOutcome::TemplateMissing);
        };

        let sql = substitute_placeholders(&template.normalized_text, &self.config.placeholder_literal);
        let plan = match self.catalog.explain_in_schema(&schema, &sql).await {
            Ok(plan) => plan,
            Err(err) => match err.engine_message() {
                Some(error) => {
                    tracing::warn!(
                        query_id,
                        environment,
                        schema = %schema,
                        error = %error,
                        "plan-only check failed"
                    );
                    return Ok(EvidenceOutcome::PlanFailed { error });
                },
                None => return Err(err.into()),
            },
        };

        let anti_patterns = detect_anti_patterns(&plan);
        let evidence_id = self
            .evidence
            .insert_evidence(&NewEvidence {
                query_id,
                explain_output: plan,
                anti_patterns: anti_patterns.clone(),
            })
            .await?;
        tracing::debug!(query_id, evidence_id, patterns = anti_patterns.len(), "evidence recorded");
        Ok(EvidenceOutcome::Recorded { evidence_id, anti_patterns })
    }

    /// Collect evidence for every id in order.
    ///
    /// Items run strictly one after another, and a failing item never stops
    /// the ones after it.
    pub async fn collect_all(&self, query_ids: &[i32], environment: &str) -> CollectionReport {
        let mut report = CollectionReport::default();
        for &query_id in query_ids {
            match self.collect(query_id, environment).await {
                Ok(EvidenceOutcome::Recorded { .. }) => report.recorded += 1,
                Ok(EvidenceOutcome::AnchorMissing { .. }) => report.anchor_missing += 1,
                Ok(EvidenceOutcome::TemplateMissing) => report.template_missing += 1,
                Ok(EvidenceOutcome::PlanFailed { .. }) => report.plan_failed += 1,
                Err(e) => {
                    tracing::warn!(query_id, environment, error = %e, "evidence collection failed");
                    report.failed += 1;
                },
            }
        }
        tracing::info!(
            environment,
            recorded = report.recorded,
            plan_failed = report.plan_failed,
            anchor_missing = report.anchor_missing,
            failed = report.failed,
            "evidence collection finished"
        );
        report
    }
}
