//! Storage layer for dbsage
//!
//! PostgreSQL adapter behind async domain traits: the persisted schema
//! snapshot, normalized query templates, execution evidence, and the live
//! catalog used for introspection, plan-only checks and execution.

pub mod error;
mod pg_migrations;
mod pg_storage;
mod row_render;
pub mod traits;

pub use error::StorageError;
pub use pg_storage::PgStorage;
pub use traits::{CatalogStore, EvidenceStore, MetadataStore, QueryStore};
