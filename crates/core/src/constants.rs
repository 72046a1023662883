//! Shared constants for dbsage.
//!
//! Centralizes defaults that the configuration layer and the services both
//! refer to.

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 5;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Schemas never introspected, never offered to the language model.
pub const SYSTEM_SCHEMAS: &[&str] = &["pg_catalog", "information_schema"];

/// `pg_catalog` relations that generated SQL may name without a schema.
pub const CATALOG_RELATIONS: &[&str] = &[
    "pg_attribute",
    "pg_class",
    "pg_constraint",
    "pg_database",
    "pg_index",
    "pg_indexes",
    "pg_matviews",
    "pg_namespace",
    "pg_proc",
    "pg_roles",
    "pg_sequences",
    "pg_settings",
    "pg_stat_activity",
    "pg_stat_user_indexes",
    "pg_stat_user_tables",
    "pg_tables",
    "pg_type",
    "pg_views",
];

/// Embedding vector dimension (BGE-M3 model: 1024d).
pub const DEFAULT_VECTOR_SIZE: usize = 1024;

/// Vector-store collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "knowledge";

/// Table whose schema is taken as the active application schema.
pub const DEFAULT_ANCHOR_TABLE: &str = "tenders";

/// Literal substituted for template placeholders before `EXPLAIN`.
pub const DEFAULT_PLACEHOLDER_LITERAL: &str = "'test'";

/// Default number of hits returned by similarity search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Maximum rows for any listing command (DoS protection).
pub const MAX_QUERY_LIMIT: usize = 1000;
