use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dbsage_core::load_config;
use dbsage_service::{BootstrapGate, Resources};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dbsage")]
#[command(about = "Schema, query-evidence and vector-index sync for retrieval-augmented SQL answering", long_about = None)]
struct Cli {
    /// Environment whose configuration layer is applied.
    #[arg(short, long, env = "DBSAGE_ENV", default_value = "dev", global = true)]
    env: String,
    /// Directory holding base.yaml and <env>.yaml.
    #[arg(long, env = "DBSAGE_CONFIG_DIR", default_value = "config", global = true)]
    config_dir: PathBuf,
    /// Run the ingest pipeline once before the command.
    #[arg(long, global = true)]
    bootstrap: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the metadata tables if missing.
    Init,
    /// Drop and recreate the metadata tables.
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Rebuild the schema snapshot from the live catalog.
    Sync,
    /// Normalize and store query definitions from a YAML file.
    IngestQueries { file: PathBuf },
    /// Record plan evidence for one template, or all of them.
    Evidence {
        #[arg(long)]
        query_id: Option<i32>,
    },
    /// Embed the stored snapshot and evidence into the vector collection.
    Index,
    /// Clear, sync, collect evidence and rebuild the vector collection.
    Pipeline,
    /// Validate, then execute, a SQL statement.
    Sql { sql: String },
    /// Answer a natural-language question with generated SQL.
    Ask { question: String },
    /// Similarity search over indexed chunks.
    Search {
        text: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Preview the rows of a table.
    Show {
        table: String,
        #[arg(short, long)]
        schema: Option<String>,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    if let Commands::Reset { yes } = &cli.command {
        commands::ingest::confirm_reset(*yes)?;
    }
    let config = load_config(&cli.config_dir, &cli.env).with_context(|| {
        format!("loading configuration for '{}' from {}", cli.env, cli.config_dir.display())
    })?;
    let resources = Resources::connect(config).await?;

    if cli.bootstrap {
        let mut gate = BootstrapGate::new();
        commands::ingest::bootstrap(&resources, &mut gate).await?;
    }

    match cli.command {
        Commands::Init => commands::ingest::run_init(&resources).await,
        Commands::Reset { .. } => commands::ingest::run_reset(&resources).await,
        Commands::Sync => commands::ingest::run_sync(&resources).await,
        Commands::IngestQueries { file } => {
            commands::ingest::run_ingest_queries(&resources, &file).await
        },
        Commands::Evidence { query_id } => commands::ingest::run_evidence(&resources, query_id).await,
        Commands::Index => commands::ingest::run_index(&resources).await,
        Commands::Pipeline => commands::ingest::run_pipeline(&resources).await,
        Commands::Sql { sql } => commands::query::run_sql(&resources, &sql).await,
        Commands::Ask { question } => commands::query::run_ask(&resources, &question).await,
        Commands::Search { text, limit } => {
            commands::search::run_search(&resources, &text, limit).await
        },
        Commands::Show { table, schema, limit } => {
            commands::query::run_show(&resources, schema.as_deref(), &table, limit).await
        },
    }
}
