//! Typed error enum for the storage layer.
//!
//! Callers match on specific failure modes (store unreachable, engine
//! rejection, not found, duplicate) instead of downcasting opaque boxes.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row not found for expected-present entity.
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Unique constraint violation.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Store unreachable: I/O, TLS, pool timeout or closed pool.
    #[error("connection failure: {0}")]
    Connection(#[source] sqlx::Error),

    /// Statement rejected by the database engine, with its verbatim message.
    #[error("rejected by database: {message}")]
    Rejected { code: Option<String>, message: String },

    /// Any other driver failure (decoding, protocol, configuration).
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Row data could not be deserialized into domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// The verbatim message of an error raised by the database engine.
    ///
    /// `None` for driver-side failures (connection, decoding, corruption),
    /// which are not a verdict on the SQL text.
    pub fn engine_message(&self) -> Option<String> {
        match self {
            Self::Duplicate(message) | Self::Rejected { message, .. } => Some(message.clone()),
            _ => None,
        }
    }
}

/// Custom `From<sqlx::Error>`, not blanket `#[from]`.
///
/// - `RowNotFound` → `NotFound` (generic; callers remap with entity context)
/// - I/O, TLS, pool timeout, pool closed, worker crash → `Connection`
/// - SQLSTATE 23505 → `Duplicate`
/// - Any other engine error → `Rejected`
/// - Everything else → `Database`
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound { entity: "row", id: "unknown".into() },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(err),
            sqlx::Error::Database(db_err) if db_err.code().is_some_and(|c| c == "23505") => {
                Self::Duplicate(db_err.message().to_owned())
            },
            sqlx::Error::Database(db_err) => Self::Rejected {
                code: db_err.code().map(|c| c.into_owned()),
                message: db_err.message().to_owned(),
            },
            _ => Self::Database(err),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption {
            context: "JSON serialization/deserialization".to_owned(),
            source: Box::new(err),
        }
    }
}
