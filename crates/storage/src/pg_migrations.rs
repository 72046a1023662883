//! PostgreSQL schema for the metadata tables.

use sqlx::PgPool;

const CREATE_TABLES_METADATA: &str = r#"
    CREATE TABLE IF NOT EXISTS tables_metadata (
        id SERIAL PRIMARY KEY,
        project_name VARCHAR(255) NOT NULL,
        database_name VARCHAR(255) NOT NULL,
        environment VARCHAR(50) NOT NULL,
        table_schema VARCHAR(255) NOT NULL,
        table_name VARCHAR(255) NOT NULL,
        column_name VARCHAR(255) NOT NULL,
        data_type TEXT NOT NULL,
        nullable BOOLEAN NOT NULL,
        default_value TEXT,
        UNIQUE (project_name, database_name, environment, table_schema, table_name, column_name)
    )
"#;

const CREATE_QUERIES: &str = r#"
    CREATE TABLE IF NOT EXISTS queries (
        id SERIAL PRIMARY KEY,
        query_name VARCHAR(255) NOT NULL UNIQUE,
        normalized_template TEXT NOT NULL,
        environment VARCHAR(50) NOT NULL
    )
"#;

const CREATE_EXECUTION_EVIDENCE: &str = r#"
    CREATE TABLE IF NOT EXISTS execution_evidence (
        id SERIAL PRIMARY KEY,
        query_id INTEGER NOT NULL REFERENCES queries(id) ON DELETE CASCADE,
        explain_output JSONB NOT NULL DEFAULT '[]',
        anti_patterns TEXT[] NOT NULL DEFAULT '{}'
    )
"#;

/// Create the metadata tables if they do not exist.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_TABLES_METADATA).execute(pool).await?;
    sqlx::query(CREATE_QUERIES).execute(pool).await?;
    sqlx::query(CREATE_EXECUTION_EVIDENCE).execute(pool).await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_queries_env ON queries (environment)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_evidence_query ON execution_evidence (query_id)",
    )
    .execute(pool)
    .await?;

    tracing::debug!("metadata tables ensured");
    Ok(())
}

/// Drop all three metadata tables and recreate them empty.
pub async fn reset_pg_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DROP TABLE IF EXISTS execution_evidence CASCADE").execute(&mut *tx).await?;
    sqlx::query("DROP TABLE IF EXISTS queries CASCADE").execute(&mut *tx).await?;
    sqlx::query("DROP TABLE IF EXISTS tables_metadata CASCADE").execute(&mut *tx).await?;
    tx.commit().await?;
    run_pg_migrations(pool).await
}
