//! Vector store for dbsage chunks
//!
//! [`VectorStore`] is the async seam the indexer and the retriever use;
//! [`QdrantStore`] implements it against Qdrant.

mod error;
mod qdrant;
mod types;

use async_trait::async_trait;

pub use error::VectorError;
pub use qdrant::QdrantStore;
pub use types::{Payload, PayloadFilter, ScoredPayload, VectorPoint};

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorError>;

    /// Create `collection` with cosine distance over `dimension`-length vectors.
    async fn create_collection(&self, collection: &str, dimension: usize) -> Result<(), VectorError>;

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorError>;

    /// Upsert all `points` in a single call, waiting for them to be applied.
    async fn upsert_points(&self, collection: &str, points: Vec<VectorPoint>)
    -> Result<(), VectorError>;

    /// Nearest neighbours of `vector`, best first.
    async fn query_points(
        &self,
        collection: &str,
        vector: Vec<f32>,
        filter: Option<PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPayload>, VectorError>;
}
