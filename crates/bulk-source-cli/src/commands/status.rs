use anyhow::Result;
use bulk_source::OperationClient;
use serde_json::{Map, Value};

use super::format;

/// Print the store's current bulk operation and the ids this machine last
/// recorded per job.
pub async fn run(client: &dyn OperationClient, cache: &Map<String, Value>) -> Result<()> {
    match client.current().await? {
        Some(op) => println!("{}", format::describe_operation(&op)),
        None => println!("No bulk operation on record."),
    }

    let recorded = recorded_operations(cache);
    if !recorded.is_empty() {
        println!();
        for (key, id) in recorded {
            println!("  {key:<40}  {id}");
        }
    }

    Ok(())
}

/// Cache entries written by sourcing runs, sorted by key.
fn recorded_operations(cache: &Map<String, Value>) -> Vec<(&str, &str)> {
    let mut entries: Vec<(&str, &str)> = cache
        .iter()
        .filter(|(key, _)| key.starts_with("last-"))
        .filter_map(|(key, value)| value.as_str().map(|id| (key.as_str(), id)))
        .collect();
    entries.sort();
    entries
}
