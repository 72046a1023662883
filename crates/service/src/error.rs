//! Typed error enum for the service layer.
//!
//! Unifies storage, vector-store, LLM, embedding and configuration failures
//! into a single error type. Query outcomes that are not failures of the
//! system itself (syntax rejection, empty result) are `QueryOutcome` values,
//! never `ServiceError`.

use dbsage_core::ConfigError;
use dbsage_embeddings::EmbeddingError;
use dbsage_llm::LlmError;
use dbsage_storage::StorageError;
use dbsage_vector::VectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (connection, engine, not found, etc.).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("vector store: {0}")]
    Vector(#[from] VectorError),

    /// LLM API call failed.
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    /// Embedding generation failed.
    #[error("embedding: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Caller provided invalid input (empty question, bad identifier).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Llm(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
