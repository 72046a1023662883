use anyhow::Result;
use dbsage_service::Resources;

use super::print_json;

pub(crate) async fn run_sql(resources: &Resources, sql: &str) -> Result<()> {
    let outcome = resources.validator().run(sql).await?;
    print_json(&outcome)
}

pub(crate) async fn run_ask(resources: &Resources, question: &str) -> Result<()> {
    let outcome = resources.planner().plan_and_run(question, resources.environment()).await?;
    print_json(&outcome)
}

pub(crate) async fn run_show(
    resources: &Resources,
    schema: Option<&str>,
    table: &str,
    limit: usize,
) -> Result<()> {
    let outcome = resources.validator().preview_table(schema, table, limit).await?;
    print_json(&outcome)
}
