//! Typed error enum for the vector-store crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("vector store client initialization failed: {0}")]
    ClientInit(String),

    #[error("vector store request failed: {0}")]
    Request(#[from] qdrant_client::QdrantError),

    /// A payload that is not a JSON object, or not representable.
    #[error("invalid payload: {0}")]
    Payload(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
