use std::sync::Arc;

use dbsage_core::SnapshotScope;
use dbsage_storage::{EvidenceStore, MetadataStore, QueryStore};
use serde::Serialize;

use crate::chunking::{chunk_evidence, chunk_metadata};
use crate::{
    CollectionReport, EvidenceCollector, IndexReport, SchemaSync, ServiceError, SyncReport,
    VectorIndexer,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub environment: String,
    pub cleared_metadata: u64,
    pub purged_evidence: u64,
    pub sync: SyncReport,
    pub evidence: CollectionReport,
    pub chunks: usize,
    pub index: IndexReport,
}

/// Full refresh: snapshot, evidence, then a rebuilt vector collection.
pub struct IngestPipeline {
    metadata: Arc<dyn MetadataStore>,
    queries: Arc<dyn QueryStore>,
    evidence: Arc<dyn EvidenceStore>,
    sync: SchemaSync,
    collector: EvidenceCollector,
    indexer: VectorIndexer,
}

impl IngestPipeline {
    #[must_use]
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        queries: Arc<dyn QueryStore>,
        evidence: Arc<dyn EvidenceStore>,
        sync: SchemaSync,
        collector: EvidenceCollector,
        indexer: VectorIndexer,
    ) -> Self {
        Self { metadata, queries, evidence, sync, collector, indexer }
    }

    /// Run every step in order. A failing step aborts the run, except for
    /// per-template evidence failures and the collection reset.
    pub async fn run(&self, scope: &SnapshotScope) -> Result<PipelineReport, ServiceError> {
        let environment = scope.environment.as_str();
        tracing::info!(environment, "ingest pipeline started");

        self.metadata.ensure_tables().await?;
        let cleared_metadata = self.metadata.clear_metadata(scope).await?;
        let purged_evidence = self.evidence.purge_evidence(environment).await?;

        let sync = self.sync.sync(scope).await?;

        let query_ids = self.queries.list_template_ids(environment).await?;
        let evidence = self.collector.collect_all(&query_ids, environment).await;

        let metadata_rows = self.metadata.list_metadata(scope).await?;
        let evidence_rows = self.evidence.list_evidence(environment).await?;
        let mut chunks = chunk_metadata(&metadata_rows);
        chunks.extend(chunk_evidence(&evidence_rows));

        self.indexer.reset_collection().await;
        let index = self.indexer.index(&chunks, environment).await?;

        let report = PipelineReport {
            environment: environment.to_owned(),
            cleared_metadata,
            purged_evidence,
            sync,
            evidence,
            chunks: chunks.len(),
            index,
        };
        tracing::info!(
            environment,
            columns = report.sync.columns,
            evidence = report.evidence.recorded,
            indexed = report.index.indexed,
            "ingest pipeline finished"
        );
        Ok(report)
    }
}

/// Caller-owned marker that lets the pipeline run once per session.
#[derive(Debug, Default)]
pub struct BootstrapGate {
    completed: bool,
}

impl BootstrapGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Run the pipeline unless a previous call already succeeded.
    ///
    /// Returns `None` when skipped. A failed run leaves the gate open.
    pub async fn run_once(
        &mut self,
        pipeline: &IngestPipeline,
        scope: &SnapshotScope,
    ) -> Result<Option<PipelineReport>, ServiceError> {
        if self.completed {
            tracing::debug!(environment = %scope.environment, "bootstrap already completed");
            return Ok(None);
        }
        let report = pipeline.run(scope).await?;
        self.completed = true;
        Ok(Some(report))
    }
}
