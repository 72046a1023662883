use std::sync::Arc;

use dbsage_embeddings::EmbeddingProvider;
use dbsage_vector::{Payload, VectorError, VectorPoint, VectorStore};
use serde::Serialize;
use serde_json::Value;

use crate::ServiceError;
use crate::chunking::Chunk;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub indexed: usize,
    pub skipped_empty: usize,
}

/// Create `collection` unless it already exists. Returns `true` when created.
pub(crate) async fn ensure_collection(
    vectors: &dyn VectorStore,
    collection: &str,
    dimension: usize,
) -> Result<bool, ServiceError> {
    if vectors.collection_exists(collection).await? {
        tracing::debug!(collection, "collection present");
        return Ok(false);
    }
    vectors.create_collection(collection, dimension).await?;
    tracing::info!(collection, dimension, "collection created");
    Ok(true)
}

/// Embed `texts` off the async runtime, checking every vector's length.
pub(crate) async fn embed_texts(
    embeddings: &Arc<dyn EmbeddingProvider>,
    texts: Vec<String>,
    dimension: usize,
) -> Result<Vec<Vec<f32>>, ServiceError> {
    let provider = Arc::clone(embeddings);
    let vectors = tokio::task::spawn_blocking(move || provider.embed_batch(&texts)).await??;
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(VectorError::DimensionMismatch { expected: dimension, actual: bad.len() }.into());
    }
    Ok(vectors)
}

/// Embeds chunks and stores them in the project's collection.
pub struct VectorIndexer {
    vectors: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    collection: String,
    dimension: usize,
    project: String,
}

impl VectorIndexer {
    #[must_use]
    pub fn new(
        vectors: Arc<dyn VectorStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
        dimension: usize,
        project: impl Into<String>,
    ) -> Self {
        Self {
            vectors,
            embeddings,
            collection: collection.into(),
            dimension,
            project: project.into(),
        }
    }

    /// Embed every non-blank chunk and upsert them all in one call.
    ///
    /// Points get fresh ids, so indexing the same chunks twice stores them
    /// twice. A failed embedding loses the whole batch.
    pub async fn index(&self, chunks: &[Chunk], environment: &str) -> Result<IndexReport, ServiceError> {
        ensure_collection(self.vectors.as_ref(), &self.collection, self.dimension).await?;

        let valid: Vec<&Chunk> = chunks.iter().filter(|c| !c.is_blank()).collect();
        let report = IndexReport { indexed: valid.len(), skipped_empty: chunks.len() - valid.len() };
        if valid.is_empty() {
            tracing::warn!(collection = %self.collection, chunks = chunks.len(), "no valid points to index");
            return Ok(report);
        }

        let texts: Vec<String> = valid.iter().map(|c| c.content_text.clone()).collect();
        let embedded = embed_texts(&self.embeddings, texts, self.dimension).await?;

        let points: Vec<VectorPoint> = valid
            .into_iter()
            .zip(embedded)
            .map(|(chunk, vector)| {
                let id = uuid::Uuid::new_v4().to_string();
                let mut payload = Payload::new();
                payload.insert("chunk_id".to_owned(), Value::from(id.clone()));
                payload.insert("content_text".to_owned(), Value::from(chunk.content_text.clone()));
                payload.insert("project".to_owned(), Value::from(self.project.clone()));
                payload.insert("environment".to_owned(), Value::from(environment));
                payload.insert("kind".to_owned(), Value::from(chunk.kind.as_str()));
                VectorPoint { id, vector, payload }
            })
            .collect();

        self.vectors.upsert_points(&self.collection, points).await?;
        tracing::info!(
            collection = %self.collection,
            indexed = report.indexed,
            skipped_empty = report.skipped_empty,
            "chunks indexed"
        );
        Ok(report)
    }

    /// Drop the collection. Failures are logged, never returned.
    pub async fn reset_collection(&self) {
        match self.vectors.collection_exists(&self.collection).await {
            Ok(true) => {
                if let Err(e) = self.vectors.delete_collection(&self.collection).await {
                    tracing::warn!(collection = %self.collection, error = %e, "collection reset failed");
                } else {
                    tracing::info!(collection = %self.collection, "collection dropped");
                }
            },
            Ok(false) => {},
            Err(e) => {
                tracing::warn!(collection = %self.collection, error = %e, "collection reset failed");
            },
        }
    }
}
