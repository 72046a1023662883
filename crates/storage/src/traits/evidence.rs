use async_trait::async_trait;
use dbsage_core::{ExecutionEvidence, NewEvidence};

use crate::error::StorageError;

/// Append-only execution evidence.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Append one evidence row. Returns its id.
    async fn insert_evidence(&self, evidence: &NewEvidence) -> Result<i32, StorageError>;

    /// Evidence of every template in `environment`, ordered by id.
    async fn list_evidence(&self, environment: &str)
    -> Result<Vec<ExecutionEvidence>, StorageError>;

    /// Delete the evidence of every template in `environment`.
    async fn purge_evidence(&self, environment: &str) -> Result<u64, StorageError>;
}
