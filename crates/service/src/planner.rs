use std::sync::Arc;

use dbsage_core::{GroundingPolicy, QueryOutcome, strip_markdown_fence};
use dbsage_llm::{LanguageModel, build_sql_messages};
use dbsage_storage::CatalogStore;

use crate::grounding::GroundingContext;
use crate::{QueryValidator, ServiceError};

/// Natural-language question → generated SQL → validated run.
pub struct NlQueryPlanner {
    catalog: Arc<dyn CatalogStore>,
    llm: Arc<dyn LanguageModel>,
    validator: QueryValidator,
    policy: GroundingPolicy,
}

impl NlQueryPlanner {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        llm: Arc<dyn LanguageModel>,
        policy: GroundingPolicy,
    ) -> Self {
        let validator = QueryValidator::new(Arc::clone(&catalog));
        Self { catalog, llm, validator, policy }
    }

    /// Generate SQL for `question` from the live column inventory and run it
    /// through the validator.
    ///
    /// There is a single generation round. A rejected statement comes back
    /// with the engine error and is not regenerated.
    pub async fn plan_and_run(
        &self,
        question: &str,
        environment: &str,
    ) -> Result<QueryOutcome, ServiceError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ServiceError::InvalidInput("question is empty".into()));
        }

        // Live catalog, not the stored snapshot
        let columns = self.catalog.introspect_columns().await?;
        let context = GroundingContext::from_columns(&columns);
        tracing::debug!(environment, identifiers = context.identifiers().len(), "grounding context built");

        let messages = build_sql_messages(question, context.identifiers());
        let completion = self.llm.complete(messages).await?;
        let sql = strip_markdown_fence(&completion).to_owned();
        tracing::info!(environment, sql = %sql, "sql generated");

        if self.policy == GroundingPolicy::Strict {
            let relations = context.out_of_scope(&sql);
            if !relations.is_empty() {
                tracing::warn!(?relations, "generated sql references relations outside the grounding context");
                return Ok(QueryOutcome::OutOfScope { sql, relations });
            }
        }

        self.validator.run(&sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbsage_core::Row;
    use serde_json::json;

    use crate::test_support::{FakeCatalog, StubLlm, live_column};

    fn catalog() -> Arc<FakeCatalog> {
        Arc::new(FakeCatalog::with_columns(vec![
            live_column("public", "items", "id", true),
            live_column("public", "items", "name", false),
        ]))
    }

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_prompt_carries_question_and_live_identifiers() {
        let catalog = catalog();
        let llm = Arc::new(StubLlm::answering("SELECT name FROM items"));
        let planner = NlQueryPlanner::new(catalog, llm.clone(), GroundingPolicy::Strict);

        planner.plan_and_run("  Which items exist?  ", "dev").await.unwrap();
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        let user = &prompts[0].last().unwrap().content;
        assert!(user.contains("Which items exist?"));
        assert!(user.contains("public.items.id"));
        assert!(user.contains("public.items.name"));
    }

    #[tokio::test]
    async fn test_catalog_question_runs_generated_sql() {
        let sql = "SELECT table_name FROM information_schema.tables";
        let catalog = catalog();
        catalog.set_rows(sql, vec![row(json!({ "table_name": "items" }))]);
        let llm = Arc::new(StubLlm::answering(sql));
        let planner = NlQueryPlanner::new(catalog.clone(), llm, GroundingPolicy::Strict);

        let outcome = planner.plan_and_run("What tables are available?", "dev").await.unwrap();
        assert_eq!(outcome, QueryOutcome::Ok {
            sql: sql.to_owned(),
            rows: vec![row(json!({ "table_name": "items" }))],
        });
        assert_eq!(catalog.executed(), vec![sql.to_owned()]);
    }

    #[tokio::test]
    async fn test_fenced_completion_is_unwrapped() {
        let catalog = catalog();
        let llm = Arc::new(StubLlm::answering("```sql\nSELECT id FROM items\n```"));
        let planner = NlQueryPlanner::new(catalog.clone(), llm, GroundingPolicy::Strict);

        let outcome = planner.plan_and_run("ids?", "dev").await.unwrap();
        assert_eq!(outcome.sql(), "SELECT id FROM items");
    }

    #[tokio::test]
    async fn test_out_of_scope_sql_is_rejected_before_validation() {
        let catalog = catalog();
        let llm = Arc::new(StubLlm::answering("SELECT * FROM payroll"));
        let planner = NlQueryPlanner::new(catalog.clone(), llm, GroundingPolicy::Strict);

        let outcome = planner.plan_and_run("salaries?", "dev").await.unwrap();
        assert_eq!(outcome, QueryOutcome::OutOfScope {
            sql: "SELECT * FROM payroll".to_owned(),
            relations: vec!["payroll".to_owned()],
        });
        assert!(catalog.explained().is_empty());
        assert!(catalog.executed().is_empty());
    }

    #[tokio::test]
    async fn test_permissive_policy_defers_to_database() {
        let catalog = catalog();
        catalog.fail_plan("payroll", "relation \"payroll\" does not exist");
        let llm = Arc::new(StubLlm::answering("SELECT * FROM payroll"));
        let planner = NlQueryPlanner::new(catalog.clone(), llm, GroundingPolicy::Permissive);

        let outcome = planner.plan_and_run("salaries?", "dev").await.unwrap();
        assert_eq!(outcome.status(), "syntax_error");
        assert!(catalog.executed().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_generated_sql_is_not_regenerated() {
        let catalog = catalog();
        catalog.fail_plan("SELEC ", "syntax error at or near \"SELEC\"");
        let llm = Arc::new(StubLlm::answering("SELEC id FROM items"));
        let planner = NlQueryPlanner::new(catalog, llm.clone(), GroundingPolicy::Permissive);

        let outcome = planner.plan_and_run("ids?", "dev").await.unwrap();
        assert!(matches!(outcome, QueryOutcome::SyntaxError { ref sql, .. } if sql == "SELEC id FROM items"));
        assert_eq!(llm.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_question_is_invalid() {
        let llm = Arc::new(StubLlm::answering("SELECT 1"));
        let planner = NlQueryPlanner::new(catalog(), llm.clone(), GroundingPolicy::Strict);
        assert!(matches!(planner.plan_and_run("   ", "dev").await, Err(ServiceError::InvalidInput(_))));
        assert!(llm.prompts().is_empty());
    }
}
