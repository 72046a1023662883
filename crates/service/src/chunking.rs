//! Turning stored metadata and evidence into indexable text units.

use dbsage_core::{ColumnMetadata, ExecutionEvidence};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Metadata,
    Evidence,
}

impl ChunkKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Evidence => "evidence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub content_text: String,
}

impl Chunk {
    #[must_use]
    pub fn new(kind: ChunkKind, content_text: impl Into<String>) -> Self {
        Self { kind, content_text: content_text.into() }
    }

    /// Chunks with only whitespace are never embedded.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content_text.trim().is_empty()
    }
}

/// One chunk per column row.
#[must_use]
pub fn chunk_metadata(rows: &[ColumnMetadata]) -> Vec<Chunk> {
    rows.iter().map(|row| Chunk::new(ChunkKind::Metadata, row.chunk_text())).collect()
}

/// One chunk per evidence row.
#[must_use]
pub fn chunk_evidence(rows: &[ExecutionEvidence]) -> Vec<Chunk> {
    rows.iter().map(|row| Chunk::new(ChunkKind::Evidence, row.chunk_text())).collect()
}
