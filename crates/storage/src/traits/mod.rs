//! Storage backend trait abstraction
//!
//! Async domain traits for the relational store, so services can be driven
//! by PostgreSQL in production and by in-memory fakes in tests.

pub mod catalog;
pub mod evidence;
pub mod metadata;
pub mod query;

pub use catalog::CatalogStore;
pub use evidence::EvidenceStore;
pub use metadata::MetadataStore;
pub use query::QueryStore;
