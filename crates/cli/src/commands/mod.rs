use anyhow::Result;
use serde::Serialize;

pub(crate) mod ingest;
pub(crate) mod query;
pub(crate) mod search;

/// Results go to stdout as pretty JSON; logs go to stderr.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
