use std::sync::Arc;

use dbsage_core::MAX_QUERY_LIMIT;
use dbsage_embeddings::EmbeddingProvider;
use dbsage_vector::{PayloadFilter, ScoredPayload, VectorStore};

use crate::ServiceError;
use crate::indexer::{embed_texts, ensure_collection};

/// Similarity search over the project's indexed chunks.
pub struct Retriever {
    vectors: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    collection: String,
    dimension: usize,
    project: String,
}

impl Retriever {
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

    pub async fn search(&self, query_text: &str, limit: usize) -> Result<Vec<ScoredPayload>, ServiceError> {
        let query_text = query_text.trim();
        if query_text.is_empty() {
            return Err(ServiceError::InvalidInput("search text is empty".into()));
        }
        let limit = limit.clamp(1, MAX_QUERY_LIMIT);
        ensure_collection(self.vectors.as_ref(), &self.collection, self.dimension).await?;

        let mut embedded = embed_texts(&self.embeddings, vec![query_text.to_owned()], self.dimension).await?;
        let Some(vector) = embedded.pop() else {
            return Ok(Vec::new());
        };
        let hits = self
            .vectors
            .query_points(
                &self.collection,
                vector,
                Some(PayloadFilter::equals("project", self.project.clone())),
                limit,
            )
            .await?;
        tracing::debug!(hits = hits.len(), limit, "similarity search");
        Ok(hits)
    }
}
