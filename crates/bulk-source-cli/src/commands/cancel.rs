use anyhow::Result;
use bulk_source::{OperationCanceller, OperationClient, OperationPoller, SourcingOptions, TokioDelay};

use super::format;

/// Cancel the store's running bulk operation, if any, and wait for it to settle.
pub async fn run(client: &dyn OperationClient, options: &SourcingOptions) -> Result<()> {
    let delay = TokioDelay;
    let poller = OperationPoller::new(
        client,
        &delay,
        options.poll_interval,
        options.max_poll_attempts,
    );

    match OperationCanceller::new(client, poller)
        .ensure_no_operation_in_progress()
        .await?
    {
        Some(settled) => {
            println!("Bulk operation settled.");
            println!("{}", format::describe_operation(&settled));
        }
        None => println!("No bulk operation in progress."),
    }

    Ok(())
}
