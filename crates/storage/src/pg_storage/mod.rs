//! PostgreSQL storage backend using sqlx.
//!
//! Split into modular files by domain concern.

mod catalog;
mod evidence;
mod metadata;
mod queries;

use std::time::Duration;

use dbsage_core::{
    PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS, PG_POOL_MAX_CONNECTIONS,
    PostgresConfig,
};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::StorageError;
use crate::pg_migrations::run_pg_migrations;

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Connect with resolved configuration and ensure the metadata tables.
    pub async fn new(config: &PostgresConfig) -> Result<Self, StorageError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.db);
        let pool = pool_options(config.max_connections).connect_with(options).await?;
        Self::from_pool(pool).await
    }

    /// Connect with a `postgres://` URL and ensure the metadata tables.
    pub async fn connect_url(database_url: &str) -> Result<Self, StorageError> {
        let pool = pool_options(PG_POOL_MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: PgPool) -> Result<Self, StorageError> {
        run_pg_migrations(&pool).await.map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::info!("PgStorage initialized");
        Ok(Self { pool })
    }

    /// Name of the database the pool is connected to.
    pub async fn current_database(&self) -> Result<String, StorageError> {
        Ok(sqlx::query_scalar("SELECT current_database()::text").fetch_one(&self.pool).await?)
    }
}

fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
        .idle_timeout(Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
        .test_before_acquire(true)
}

/// Double-quote an identifier for interpolation into SQL text.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::quote_ident;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("public"), "\"public\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
