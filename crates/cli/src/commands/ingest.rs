use std::path::Path;

use anyhow::{Context, Result, bail};
use dbsage_core::load_query_definitions;
use dbsage_service::{BootstrapGate, Resources};
use serde_json::json;

use super::print_json;

pub(crate) async fn run_init(resources: &Resources) -> Result<()> {
    resources.init_tables().await?;
    print_json(&json!({ "status": "ok", "environment": resources.environment() }))
}

/// Refuse an unconfirmed reset before any configuration or connection work.
pub(crate) fn confirm_reset(confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("reset drops every metadata, template and evidence row; pass --yes to proceed");
    }
    Ok(())
}

pub(crate) async fn run_reset(resources: &Resources) -> Result<()> {
    resources.reset_tables().await?;
    print_json(&json!({ "status": "reset", "environment": resources.environment() }))
}

pub(crate) async fn run_sync(resources: &Resources) -> Result<()> {
    let report = resources.schema_sync().sync(&resources.scope()).await?;
    print_json(&report)
}

pub(crate) async fn run_ingest_queries(resources: &Resources, file: &Path) -> Result<()> {
    let definitions = load_query_definitions(file)
        .with_context(|| format!("reading query definitions from {}", file.display()))?;
    let report = resources.query_ingestor().ingest(&definitions, resources.environment()).await?;
    print_json(&report)
}

pub(crate) async fn run_evidence(resources: &Resources, query_id: Option<i32>) -> Result<()> {
    let collector = resources.evidence_collector();
    let environment = resources.environment();
    match query_id {
        Some(id) => print_json(&collector.collect(id, environment).await?),
        None => {
            let ids = resources.template_ids().await?;
            print_json(&collector.collect_all(&ids, environment).await)
        },
    }
}

/// Index the stored snapshot and evidence without resetting the collection.
pub(crate) async fn run_index(resources: &Resources) -> Result<()> {
    let chunks = resources.stored_chunks().await?;
    let report = resources.indexer().await?.index(&chunks, resources.environment()).await?;
    print_json(&report)
}

pub(crate) async fn run_pipeline(resources: &Resources) -> Result<()> {
    let report = resources.pipeline().await?.run(&resources.scope()).await?;
    print_json(&report)
}

/// Run the pipeline through `gate`, logging instead of printing.
pub(crate) async fn bootstrap(resources: &Resources, gate: &mut BootstrapGate) -> Result<()> {
    let pipeline = resources.pipeline().await?;
    if let Some(report) = gate.run_once(&pipeline, &resources.scope()).await? {
        tracing::info!(
            columns = report.sync.columns,
            evidence = report.evidence.recorded,
            indexed = report.index.indexed,
            "bootstrap completed"
        );
    }
    Ok(())
}
