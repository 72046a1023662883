//! Registry of the external clients one environment needs.
//!
//! Built once from a resolved [`AppConfig`] and handed to every component.
//! The embedding model is loaded on first use, since most commands never
//! touch it.

use std::sync::Arc;

use dbsage_core::{AppConfig, SnapshotScope};
use dbsage_embeddings::{EmbeddingProvider, EmbeddingService};
use dbsage_llm::{LanguageModel, LlmClient};
use dbsage_storage::{CatalogStore, EvidenceStore, MetadataStore, PgStorage, QueryStore};
use dbsage_vector::{QdrantStore, VectorStore};
use tokio::sync::OnceCell;

use crate::chunking::{Chunk, chunk_evidence, chunk_metadata};
use crate::{
    EvidenceCollector, IngestPipeline, NlQueryPlanner, QueryIngestor, QueryValidator, Retriever,
    SchemaSync, ServiceError, VectorIndexer,
};

/// Trait-object handles for every backend.
#[derive(Clone)]
pub struct Backends {
    pub metadata: Arc<dyn MetadataStore>,
    pub queries: Arc<dyn QueryStore>,
    pub evidence: Arc<dyn EvidenceStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub vectors: Arc<dyn VectorStore>,
    pub llm: Arc<dyn LanguageModel>,
    /// Preloaded embedder; loaded from configuration on demand when `None`.
    pub embeddings: Option<Arc<dyn EmbeddingProvider>>,
}

pub struct Resources {
    config: AppConfig,
    backends: Backends,
    embeddings: OnceCell<Arc<dyn EmbeddingProvider>>,
}

impl Resources {
    /// Connect to PostgreSQL (running migrations) and build the Qdrant and
    /// language-model clients.
    pub async fn connect(config: AppConfig) -> Result<Self, ServiceError> {
        let pg = Arc::new(PgStorage::new(&config.postgres).await?);
        let vectors = Arc::new(QdrantStore::new(&config.qdrant)?);
        let llm = Arc::new(LlmClient::new(&config.llm)?);
        tracing::info!(
            environment = %config.environment,
            database = %config.postgres.db,
            qdrant = %config.qdrant.url(),
            "resources ready"
        );
        Ok(Self::from_backends(config, Backends {
            metadata: pg.clone(),
            queries: pg.clone(),
            evidence: pg.clone(),
            catalog: pg,
            vectors,
            llm,
            embeddings: None,
        }))
    }

    #[must_use]
    pub fn from_backends(config: AppConfig, mut backends: Backends) -> Self {
        let embeddings = OnceCell::new_with(backends.embeddings.take());
        Self { config, backends, embeddings }
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub const fn backends(&self) -> &Backends {
        &self.backends
    }

    #[must_use]
    pub fn environment(&self) -> &str {
        &self.config.environment
    }

    /// Snapshot prefix for this environment: configured project and database.
    #[must_use]
    pub fn scope(&self) -> SnapshotScope {
        SnapshotScope::new(
            self.config.project_name.clone(),
            self.config.postgres.db.clone(),
            self.config.environment.clone(),
        )
    }

    /// The embedding model, loading it on the first call.
    pub async fn embeddings(&self) -> Result<Arc<dyn EmbeddingProvider>, ServiceError> {
        let provider = self
            .embeddings
            .get_or_try_init(|| async {
                let config = self.config.embedding.clone();
                tracing::info!(model = %config.model, "loading embedding model");
                let service =
                    tokio::task::spawn_blocking(move || EmbeddingService::new(&config)).await??;
                let expected = self.config.qdrant.vector_size;
                if service.dimension() != expected {
                    tracing::warn!(
                        model = %service.model_name(),
                        model_dimension = service.dimension(),
                        vector_size = expected,
                        "embedding dimension differs from configured vector size"
                    );
                }
                Ok::<Arc<dyn EmbeddingProvider>, ServiceError>(Arc::new(service))
            })
            .await?;
        Ok(Arc::clone(provider))
    }

    #[must_use]
    pub fn schema_sync(&self) -> SchemaSync {
        SchemaSync::new(self.backends.metadata.clone(), self.backends.catalog.clone())
    }

    #[must_use]
    pub fn query_ingestor(&self) -> QueryIngestor {
        QueryIngestor::new(self.backends.queries.clone(), self.config.normalizer)
    }

    #[must_use]
    pub fn evidence_collector(&self) -> EvidenceCollector {
        EvidenceCollector::new(
            self.backends.queries.clone(),
            self.backends.evidence.clone(),
            self.backends.catalog.clone(),
            self.config.evidence.clone(),
        )
    }

    #[must_use]
    pub fn validator(&self) -> QueryValidator {
        QueryValidator::new(self.backends.catalog.clone())
    }

    #[must_use]
    pub fn planner(&self) -> NlQueryPlanner {
        NlQueryPlanner::new(
            self.backends.catalog.clone(),
            self.backends.llm.clone(),
            self.config.planner.grounding_policy,
        )
    }

    pub async fn indexer(&self) -> Result<VectorIndexer, ServiceError> {
        Ok(VectorIndexer::new(
            self.backends.vectors.clone(),
            self.embeddings().await?,
            self.config.qdrant.collection.clone(),
            self.config.qdrant.vector_size,
            self.config.project_name.clone(),
        ))
    }

    pub async fn retriever(&self) -> Result<Retriever, ServiceError> {
        Ok(Retriever::new(
            self.backends.vectors.clone(),
            self.embeddings().await?,
            self.config.qdrant.collection.clone(),
            self.config.qdrant.vector_size,
            self.config.project_name.clone(),
        ))
    }

    pub async fn pipeline(&self) -> Result<IngestPipeline, ServiceError> {
        Ok(IngestPipeline::new(
            self.backends.metadata.clone(),
            self.backends.queries.clone(),
            self.backends.evidence.clone(),
            self.schema_sync(),
            self.evidence_collector(),
            self.indexer().await?,
        ))
    }

    /// Ids of every stored template of this environment.
    pub async fn template_ids(&self) -> Result<Vec<i32>, ServiceError> {
        Ok(self.backends.queries.list_template_ids(self.environment()).await?)
    }

    /// Chunks for the stored snapshot followed by the stored evidence.
    pub async fn stored_chunks(&self) -> Result<Vec<Chunk>, ServiceError> {
        let mut chunks = chunk_metadata(&self.backends.metadata.list_metadata(&self.scope()).await?);
        chunks.extend(chunk_evidence(&self.backends.evidence.list_evidence(self.environment()).await?));
        Ok(chunks)
    }

    /// Create the metadata tables if missing.
    pub async fn init_tables(&self) -> Result<(), ServiceError> {
        Ok(self.backends.metadata.ensure_tables().await?)
    }

    /// Drop and recreate the metadata tables.
    pub async fn reset_tables(&self) -> Result<(), ServiceError> {
        Ok(self.backends.metadata.reset_tables().await?)
    }
}
