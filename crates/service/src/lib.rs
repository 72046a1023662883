//! Service layer for dbsage
//!
//! Schema synchronization, query-template ingestion, evidence collection,
//! the validate-then-execute protocol, natural-language planning and vector
//! indexing, all driven through the backend traits so they can run against
//! PostgreSQL and Qdrant or in-memory fakes.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Services hold trait objects")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short error vars are idiomatic")]

mod chunking;
mod error;
mod evidence_collector;
mod grounding;
mod indexer;
mod pipeline;
mod planner;
mod query_ingest;
mod resources;
mod retriever;
mod schema_sync;
mod validator;

#[cfg(test)]
mod test_support;

pub use chunking::{Chunk, ChunkKind, chunk_evidence, chunk_metadata};
pub use error::ServiceError;
pub use evidence_collector::{CollectionReport, EvidenceCollector, EvidenceOutcome};
pub use grounding::GroundingContext;
pub use indexer::{IndexReport, VectorIndexer};
pub use pipeline::{BootstrapGate, IngestPipeline, PipelineReport};
pub use planner::NlQueryPlanner;
pub use query_ingest::{IngestReport, QueryIngestor};
pub use resources::{Backends, Resources};
pub use retriever::Retriever;
pub use schema_sync::{SchemaSync, SyncReport};
pub use validator::QueryValidator;
