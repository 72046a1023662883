use anyhow::Result;
use dbsage_service::Resources;

use super::print_json;

pub(crate) async fn run_search(resources: &Resources, text: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(resources.config().planner.search_limit);
    let hits = resources.retriever().await?.search(text, limit).await?;
    print_json(&hits)
}
