use std::time::Duration;

use tracing::{debug, warn};

use crate::client::{ClientError, OperationClient};
use crate::delay::Delay;
use crate::error::SourcingError;
use crate::operation::{BulkOperation, OperationId, OperationStatus};

/// Drives a bulk operation id to a terminal status.
///
/// The remote platform has no push notification, so the loop is bounded by
/// `max_attempts`, at least one. A network fault consumes one attempt and the
/// next poll retries; any other client error ends the loop.
pub struct OperationPoller<'a> {
    client: &'a dyn OperationClient,
    delay: &'a dyn Delay,
    interval: Duration,
    max_attempts: u32,
}

impl<'a> OperationPoller<'a> {
    pub fn new(
        client: &'a dyn OperationClient,
        delay: &'a dyn Delay,
        interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            client,
            delay,
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Poll `id` until it is terminal, calling `on_progress` after every
    /// successful fetch. Returns the terminal snapshot exactly once.
    pub async fn await_completion<F>(
        &self,
        id: &OperationId,
        mut on_progress: F,
    ) -> Result<BulkOperation, SourcingError>
    where
        F: FnMut(OperationStatus, u64),
    {
        for attempt in 1..=self.max_attempts {
            match self.client.by_id(id).await {
                Ok(operation) => {
                    on_progress(operation.status, operation.object_count);
                    if operation.is_terminal() {
                        debug!(operation_id = %id, status = %operation.status, attempt, "bulk operation settled");
                        return Ok(operation);
                    }
                    debug!(
                        operation_id = %id,
                        status = %operation.status,
                        object_count = operation.object_count,
                        attempt,
                        "bulk operation still in progress"
                    );
                }
                Err(ClientError::Network(message)) => {
                    warn!(operation_id = %id, attempt, %message, "poll failed, retrying");
                }
                Err(err) => return Err(err.into()),
            }

            if attempt < self.max_attempts {
                self.delay.wait(self.interval).await;
            }
        }

        Err(SourcingError::PollTimeout {
            id: id.clone(),
            attempts: self.max_attempts,
        })
    }
}
