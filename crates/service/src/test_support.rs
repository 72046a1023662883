//! In-memory fakes of every backend seam, for service unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use dbsage_core::{
    ColumnMetadata, ExecutionEvidence, LiveColumn, NewEvidence, NewQueryTemplate, QueryTemplate,
    Row, SnapshotScope,
};
use dbsage_embeddings::{EmbeddingError, EmbeddingProvider};
use dbsage_llm::{LanguageModel, LlmError, Message};
use dbsage_storage::{CatalogStore, EvidenceStore, MetadataStore, QueryStore, StorageError};
use dbsage_vector::{PayloadFilter, ScoredPayload, VectorError, VectorPoint, VectorStore};

pub(crate) fn live_column(schema: &str, table: &str, column: &str, nullable: bool) -> LiveColumn {
    LiveColumn {
        schema: schema.to_owned(),
        table: table.to_owned(),
        column: column.to_owned(),
        data_type: "text".to_owned(),
        nullable,
        default: None,
    }
}

pub(crate) fn rejected(message: &str) -> StorageError {
    StorageError::Rejected { code: Some("42601".to_owned()), message: message.to_owned() }
}

#[derive(Default)]
struct MemoryInner {
    metadata: Vec<ColumnMetadata>,
    templates: BTreeMap<i32, QueryTemplate>,
    evidence: Vec<ExecutionEvidence>,
    next_evidence_id: i32,
    resets: usize,
}

/// Metadata, template and evidence tables held in memory.
#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub(crate) fn evidence_rows(&self) -> Vec<ExecutionEvidence> {
        self.inner.lock().unwrap().evidence.clone()
    }

    pub(crate) fn reset_count(&self) -> usize {
        self.inner.lock().unwrap().resets
    }
}

fn in_scope(row: &ColumnMetadata, scope: &SnapshotScope) -> bool {
    row.project == scope.project
        && row.database == scope.database
        && row.environment == scope.environment
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn ensure_tables(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn reset_tables(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let resets = inner.resets + 1;
        *inner = MemoryInner { resets, ..MemoryInner::default() };
        Ok(())
    }

    async fn clear_metadata(&self, scope: &SnapshotScope) -> Result<u64, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.metadata.len();
        inner.metadata.retain(|row| !in_scope(row, scope));
        Ok((before - inner.metadata.len()) as u64)
    }

    async fn replace_snapshot(
        &self,
        scope: &SnapshotScope,
        rows: &[ColumnMetadata],
    ) -> Result<u64, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.metadata.retain(|row| !in_scope(row, scope));
        let mut inserted = 0;
        for row in rows {
            if inner.metadata.iter().any(|existing| existing.key() == row.key()) {
                continue;
            }
            inner.metadata.push(row.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn list_metadata(
        &self,
        scope: &SnapshotScope,
    ) -> Result<Vec<ColumnMetadata>, StorageError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<ColumnMetadata> =
            inner.metadata.iter().filter(|row| in_scope(row, scope)).cloned().collect();
        rows.sort_by(|a, b| {
            (&a.schema, &a.table, &a.column).cmp(&(&b.schema, &b.table, &b.column))
        });
        Ok(rows)
    }
}

#[async_trait]
impl QueryStore for MemoryStore {
    async fn insert_template(&self, template: &NewQueryTemplate) -> Result<bool, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.templates.values().any(|t| t.name == template.name) {
            return Ok(false);
        }
        let id = inner.templates.keys().next_back().copied().unwrap_or(0) + 1;
        inner.templates.insert(
            id,
            QueryTemplate {
                id,
                name: template.name.clone(),
                normalized_text: template.normalized_text.clone(),
                environment: template.environment.clone(),
            },
        );
        Ok(true)
    }

    async fn get_template(&self, id: i32) -> Result<Option<QueryTemplate>, StorageError> {
        Ok(self.inner.lock().unwrap().templates.get(&id).cloned())
    }

    async fn list_template_ids(&self, environment: &str) -> Result<Vec<i32>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .templates
            .values()
            .filter(|t| t.environment == environment)
            .map(|t| t.id)
            .collect())
    }
}

#[async_trait]
impl EvidenceStore for MemoryStore {
    async fn insert_evidence(&self, evidence: &NewEvidence) -> Result<i32, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.templates.contains_key(&evidence.query_id) {
            return Err(StorageError::NotFound {
                entity: "query",
                id: evidence.query_id.to_string(),
            });
        }
        inner.next_evidence_id += 1;
        let id = inner.next_evidence_id;
        inner.evidence.push(ExecutionEvidence {
            id,
            query_id: evidence.query_id,
            explain_output: evidence.explain_output.clone(),
            anti_patterns: evidence.anti_patterns.clone(),
        });
        Ok(id)
    }

    async fn list_evidence(
        &self,
        environment: &str,
    ) -> Result<Vec<ExecutionEvidence>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .evidence
            .iter()
            .filter(|e| inner.templates.get(&e.query_id).is_some_and(|t| t.environment == environment))
            .cloned()
            .collect())
    }

    async fn purge_evidence(&self, environment: &str) -> Result<u64, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let ids: Vec<i32> = inner
            .templates
            .values()
            .filter(|t| t.environment == environment)
            .map(|t| t.id)
            .collect();
        let before = inner.evidence.len();
        inner.evidence.retain(|e| !ids.contains(&e.query_id));
        Ok((before - inner.evidence.len()) as u64)
    }
}

#[derive(Default)]
struct CatalogInner {
    columns: Vec<LiveColumn>,
    /// table name → schema that holds it
    tables: HashMap<String, String>,
    /// SQL substring → engine message for plan-only rejection
    plan_failures: Vec<(String, String)>,
    /// SQL substring → engine message for execution failure
    exec_failures: Vec<(String, String)>,
    plans: HashMap<String, Vec<String>>,
    results: HashMap<String, Vec<Row>>,
    unreachable: bool,
    explained: Vec<(Option<String>, String)>,
    executed: Vec<String>,
}

/// Scriptable live catalog that records every statement it is handed.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    inner: Mutex<CatalogInner>,
}

impl FakeCatalog {
    pub(crate) fn with_columns(columns: Vec<LiveColumn>) -> Self {
        let catalog = Self::default();
        catalog.set_columns(columns);
        catalog
    }

    /// Every call fails as if the pool could not connect.
    pub(crate) fn unreachable() -> Self {
        let catalog = Self::default();
        catalog.inner.lock().unwrap().unreachable = true;
        catalog
    }

    pub(crate) fn set_columns(&self, columns: Vec<LiveColumn>) {
        self.inner.lock().unwrap().columns = columns;
    }

    pub(crate) fn add_table(&self, schema: &str, table: &str) {
        self.inner.lock().unwrap().tables.insert(table.to_owned(), schema.to_owned());
    }

    pub(crate) fn fail_plan(&self, sql_fragment: &str, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .plan_failures
            .push((sql_fragment.to_owned(), message.to_owned()));
    }

    pub(crate) fn fail_execution(&self, sql_fragment: &str, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .exec_failures
            .push((sql_fragment.to_owned(), message.to_owned()));
    }

    pub(crate) fn set_plan(&self, sql: &str, lines: &[&str]) {
        self.inner
            .lock()
            .unwrap()
            .plans
            .insert(sql.to_owned(), lines.iter().map(|l| (*l).to_owned()).collect());
    }

    pub(crate) fn set_rows(&self, sql: &str, rows: Vec<Row>) {
        self.inner.lock().unwrap().results.insert(sql.to_owned(), rows);
    }

    /// `(schema, sql)` of every plan-only check, in call order.
    pub(crate) fn explained(&self) -> Vec<(Option<String>, String)> {
        self.inner.lock().unwrap().explained.clone()
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.inner.lock().unwrap().executed.clone()
    }

    fn plan(&self, schema: Option<&str>, sql: &str) -> Result<Vec<serde_json::Value>, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(StorageError::Connection(sqlx::Error::PoolTimedOut));
        }
        inner.explained.push((schema.map(str::to_owned), sql.to_owned()));
        if let Some((_, message)) =
            inner.plan_failures.iter().find(|(fragment, _)| sql.contains(fragment.as_str()))
        {
            return Err(rejected(message));
        }
        let lines = inner
            .plans
            .get(sql)
            .cloned()
            .unwrap_or_else(|| vec!["Result  (cost=0.00..0.01 rows=1 width=4)".to_owned()]);
        Ok(lines.into_iter().map(|line| serde_json::json!({ "QUERY PLAN": line })).collect())
    }
}

#[async_trait]
impl CatalogStore for FakeCatalog {
    async fn introspect_columns(&self) -> Result<Vec<LiveColumn>, StorageError> {
        let inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(StorageError::Connection(sqlx::Error::PoolTimedOut));
        }
        Ok(inner.columns.clone())
    }

    async fn find_table_schema(&self, table: &str) -> Result<Option<String>, StorageError> {
        let inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(StorageError::Connection(sqlx::Error::PoolTimedOut));
        }
        Ok(inner.tables.get(table).cloned())
    }

    async fn explain(&self, sql: &str) -> Result<Vec<serde_json::Value>, StorageError> {
        self.plan(None, sql)
    }

    async fn explain_in_schema(
        &self,
        schema: &str,
        sql: &str,
    ) -> Result<Vec<serde_json::Value>, StorageError> {
        self.plan(Some(schema), sql)
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(StorageError::Connection(sqlx::Error::PoolTimedOut));
        }
        inner.executed.push(sql.to_owned());
        if let Some((_, message)) =
            inner.exec_failures.iter().find(|(fragment, _)| sql.contains(fragment.as_str()))
        {
            return Err(rejected(message));
        }
        Ok(inner.results.get(sql).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct VectorInner {
    collections: HashMap<String, (usize, Vec<VectorPoint>)>,
    upsert_calls: usize,
    queries: Vec<(String, Option<PayloadFilter>, usize)>,
    fail_delete: bool,
}

/// Vector store keeping points per collection; search returns stored points
/// matching the filter, scored by insertion order.
#[derive(Default)]
pub(crate) struct FakeVectors {
    inner: Mutex<VectorInner>,
}

impl FakeVectors {
    pub(crate) fn points(&self, collection: &str) -> Vec<VectorPoint> {
        let inner = self.inner.lock().unwrap();
        inner.collections.get(collection).map(|(_, points)| points.clone()).unwrap_or_default()
    }

    pub(crate) fn dimension(&self, collection: &str) -> Option<usize> {
        self.inner.lock().unwrap().collections.get(collection).map(|(dim, _)| *dim)
    }

    pub(crate) fn upsert_calls(&self) -> usize {
        self.inner.lock().unwrap().upsert_calls
    }

    pub(crate) fn queries(&self) -> Vec<(String, Option<PayloadFilter>, usize)> {
        self.inner.lock().unwrap().queries.clone()
    }

    pub(crate) fn fail_deletes(&self) {
        self.inner.lock().unwrap().fail_delete = true;
    }
}

#[async_trait]
impl VectorStore for FakeVectors {
    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorError> {
        Ok(self.inner.lock().unwrap().collections.contains_key(collection))
    }

    async fn create_collection(&self, collection: &str, dimension: usize) -> Result<(), VectorError> {
        self.inner
            .lock()
            .unwrap()
            .collections
            .entry(collection.to_owned())
            .or_insert((dimension, Vec::new()));
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_delete {
            return Err(VectorError::Payload("delete refused".to_owned()));
        }
        inner.collections.remove(collection);
        Ok(())
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorError> {
        let mut inner = self.inner.lock().unwrap();
        inner.upsert_calls += 1;
        let Some((_, stored)) = inner.collections.get_mut(collection) else {
            return Err(VectorError::Payload(format!("no collection {collection}")));
        };
        stored.extend(points);
        Ok(())
    }

    async fn query_points(
        &self,
        collection: &str,
        _vector: Vec<f32>,
        filter: Option<PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPayload>, VectorError> {
        let mut inner = self.inner.lock().unwrap();
        inner.queries.push((collection.to_owned(), filter.clone(), limit));
        let points = inner.collections.get(collection).map(|(_, p)| p.clone()).unwrap_or_default();
        Ok(points
            .into_iter()
            .filter(|p| {
                filter.as_ref().is_none_or(|f| {
                    p.payload.get(&f.key).and_then(|v| v.as_str()) == Some(f.value.as_str())
                })
            })
            .take(limit)
            .enumerate()
            .map(|(rank, p)| ScoredPayload {
                id: p.id,
                score: 1.0 - rank as f32 * 0.1,
                payload: p.payload,
            })
            .collect())
    }
}

/// Deterministic embedder: every component is the text length.
pub(crate) struct FakeEmbedder {
    pub(crate) dimension: usize,
    /// Texts containing this marker fail to embed.
    pub(crate) fail_on: Option<&'static str>,
}

impl FakeEmbedder {
    pub(crate) fn new(dimension: usize) -> Self {
        Self { dimension, fail_on: None }
    }
}

impl EmbeddingProvider for FakeEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.fail_on.is_some_and(|marker| text.contains(marker)) {
            return Err(EmbeddingError::Generation(format!("cannot embed {text}")));
        }
        Ok(vec![text.len() as f32; self.dimension])
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Language model answering every prompt with a fixed completion.
pub(crate) struct StubLlm {
    completion: String,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl StubLlm {
    pub(crate) fn answering(completion: &str) -> Self {
        Self { completion: completion.to_owned(), prompts: Mutex::new(Vec::new()) }
    }

    pub(crate) fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for StubLlm {
    async fn complete(&self, messages: Vec<Message>) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(messages);
        Ok(self.completion.clone())
    }
}
