//! End-to-end service scenarios against a live PostgreSQL.
//! Run with: DATABASE_URL=... cargo test -p dbsage-service -- --ignored pg_

#![allow(clippy::unwrap_used, reason = "integration test code")]
#![allow(clippy::expect_used, reason = "integration test code")]

use std::sync::Arc;

use async_trait::async_trait;
use dbsage_core::{
    AntiPattern, EvidenceConfig, GroundingPolicy, NormalizeOptions, QueryDefinition, QueryOutcome,
    SnapshotScope,
};
use dbsage_llm::{LanguageModel, LlmError, Message};
use dbsage_service::{
    EvidenceCollector, EvidenceOutcome, NlQueryPlanner, QueryIngestor, QueryValidator, SchemaSync,
};
use dbsage_storage::{CatalogStore, EvidenceStore, MetadataStore, PgStorage, QueryStore};
use uuid::Uuid;

struct FixedCompletion(String);

#[async_trait]
impl LanguageModel for FixedCompletion {
    async fn complete(&self, _messages: Vec<Message>) -> Result<String, LlmError> {
        Ok(self.0.clone())
    }
}

async fn create_pg_storage() -> Arc<PgStorage> {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for service integration tests");
    Arc::new(PgStorage::connect_url(&url).await.expect("Failed to connect to PostgreSQL"))
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore]
async fn pg_typo_is_syntax_error_without_side_effects() {
    let storage = create_pg_storage().await;
    let validator = QueryValidator::new(storage.clone());

    let outcome = validator.run("SELCT 1").await.unwrap();
    let QueryOutcome::SyntaxError { sql, error } = outcome else {
        panic!("expected syntax_error, got {outcome:?}");
    };
    assert_eq!(sql, "SELCT 1");
    assert!(error.contains("SELCT"), "engine message should name the token: {error}");

    // A rejected statement must not run: the table is never created.
    let table = unique_name("never_created");
    let outcome = validator.run(&format!("CREAT TABLE {table} (id int)")).await.unwrap();
    assert_eq!(outcome.status(), "syntax_error");
    let exists = validator
        .run(&format!("SELECT 1 FROM information_schema.tables WHERE table_name = '{table}'"))
        .await
        .unwrap();
    assert_eq!(exists.status(), "empty_result");
}

#[tokio::test]
#[ignore]
async fn pg_analyze_prefix_cannot_write_during_validation() {
    let storage = create_pg_storage().await;
    let table = unique_name("guarded");
    storage.execute(&format!("CREATE TABLE {table} (id int)")).await.unwrap();
    storage.execute(&format!("INSERT INTO {table} VALUES (1), (2), (3)")).await.unwrap();
    let validator = QueryValidator::new(storage.clone());

    let outcome = validator.run(&format!("ANALYZE DELETE FROM {table}")).await.unwrap();
    assert_eq!(outcome.status(), "syntax_error", "{outcome:?}");

    let outcome = validator.run(&format!("SELECT count(*) AS n FROM {table}")).await.unwrap();
    let QueryOutcome::Ok { rows, .. } = outcome else {
        panic!("expected ok, got {outcome:?}");
    };
    assert_eq!(rows[0]["n"], serde_json::json!(3));

    storage.execute(&format!("DROP TABLE {table}")).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn pg_select_one_is_ok() {
    let storage = create_pg_storage().await;
    let outcome = QueryValidator::new(storage).run("SELECT 1").await.unwrap();

    let QueryOutcome::Ok { rows, .. } = outcome else {
        panic!("expected ok, got {outcome:?}");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values().next(), Some(&serde_json::json!(1)));
}

#[tokio::test]
#[ignore]
async fn pg_catalog_question_matches_seeded_tables() {
    let storage = create_pg_storage().await;
    let schema = unique_name("dbsage_nl");
    storage.execute(&format!("CREATE SCHEMA {schema}")).await.unwrap();
    storage.execute(&format!("CREATE TABLE {schema}.items (id int)")).await.unwrap();
    storage.execute(&format!("CREATE TABLE {schema}.orders (id int)")).await.unwrap();

    let sql = format!(
        "SELECT table_name FROM information_schema.tables WHERE table_schema = '{schema}' \
         ORDER BY table_name"
    );
    let planner =
        NlQueryPlanner::new(storage.clone(), Arc::new(FixedCompletion(sql)), GroundingPolicy::Strict);

    let outcome = planner.plan_and_run("What tables are available?", "it").await.unwrap();
    let QueryOutcome::Ok { rows, .. } = outcome else {
        panic!("expected ok, got {outcome:?}");
    };
    let names: Vec<&str> = rows.iter().filter_map(|r| r["table_name"].as_str()).collect();
    assert_eq!(names, vec!["items", "orders"]);

    storage.execute(&format!("DROP SCHEMA {schema} CASCADE")).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn pg_sync_then_evidence_in_anchor_schema() {
    let storage = create_pg_storage().await;
    let schema = unique_name("dbsage_ev");
    let anchor = unique_name("tenders");
    storage.execute(&format!("CREATE SCHEMA {schema}")).await.unwrap();
    storage
        .execute(&format!("CREATE TABLE {schema}.{anchor} (id int, title text NOT NULL)"))
        .await
        .unwrap();

    let env = unique_name("env");
    let scope = SnapshotScope::new("it", "db", env.clone());
    let report = SchemaSync::new(storage.clone(), storage.clone()).sync(&scope).await.unwrap();
    assert!(report.columns >= 2);
    let ours: Vec<_> = storage
        .list_metadata(&scope)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.schema == schema)
        .collect();
    assert_eq!(ours.len(), 2);

    let ingest = QueryIngestor::new(storage.clone(), NormalizeOptions::default());
    ingest
        .ingest(
            &[QueryDefinition {
                name: unique_name("by_title"),
                template: format!("select * from {schema}.{anchor} where title = 'x'"),
            }],
            &env,
        )
        .await
        .unwrap();
    let query_id = storage.list_template_ids(&env).await.unwrap()[0];

    let collector = EvidenceCollector::new(storage.clone(), storage.clone(), storage.clone(), EvidenceConfig {
        anchor_table: anchor.clone(),
        placeholder_literal: "'test'".to_owned(),
    });
    let outcome = collector.collect(query_id, &env).await.unwrap();
    let EvidenceOutcome::Recorded { anti_patterns, .. } = outcome else {
        panic!("expected evidence, got {outcome:?}");
    };
    assert!(anti_patterns.contains(&AntiPattern::SequentialScan));
    assert_eq!(storage.list_evidence(&env).await.unwrap().len(), 1);

    storage.purge_evidence(&env).await.unwrap();
    storage.clear_metadata(&scope).await.unwrap();
    storage.execute(&format!("DROP SCHEMA {schema} CASCADE")).await.unwrap();
}
