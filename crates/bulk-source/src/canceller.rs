use tracing::{debug, info};

use crate::client::{ClientError, OperationClient};
use crate::error::SourcingError;
use crate::operation::BulkOperation;
use crate::poller::OperationPoller;

/// Keeps the store's single bulk operation slot free before a new job starts.
///
/// There is no lock on the remote side; the guarantee is that every run goes
/// through here and waits for any running job to settle.
pub struct OperationCanceller<'a> {
    client: &'a dyn OperationClient,
    poller: OperationPoller<'a>,
}

impl<'a> OperationCanceller<'a> {
    pub fn new(client: &'a dyn OperationClient, poller: OperationPoller<'a>) -> Self {
        Self { client, poller }
    }

    /// Cancel a running job, if any, and wait until it is terminal.
    ///
    /// Returns the settled operation when one had to be canceled. Makes no
    /// cancel call when nothing is running.
    pub async fn ensure_no_operation_in_progress(
        &self,
    ) -> Result<Option<BulkOperation>, SourcingError> {
        let Some(running) = self.running_operation().await? else {
            return Ok(None);
        };

        info!(operation_id = %running.id, status = %running.status, "canceling bulk operation in progress");

        match self.client.cancel(&running.id).await {
            Ok(canceling) => {
                debug!(operation_id = %canceling.id, status = %canceling.status, "cancel requested");
            }
            Err(ClientError::Rejected(messages)) => {
                // The job may have finished between the status check and the cancel.
                let latest = self.client.by_id(&running.id).await?;
                if latest.is_terminal() {
                    debug!(operation_id = %latest.id, status = %latest.status, "operation settled before cancel");
                    return Ok(Some(latest));
                }
                return Err(SourcingError::RequestRejected(messages));
            }
            Err(err) => return Err(err.into()),
        }

        self.settle(&running).await.map(Some)
    }

    /// Wait for a running job, if any, to finish on its own.
    pub async fn await_operation_in_progress(
        &self,
    ) -> Result<Option<BulkOperation>, SourcingError> {
        let Some(running) = self.running_operation().await? else {
            return Ok(None);
        };

        info!(operation_id = %running.id, status = %running.status, "waiting for bulk operation in progress");
        self.settle(&running).await.map(Some)
    }

    async fn running_operation(&self) -> Result<Option<BulkOperation>, SourcingError> {
        match self.client.current().await? {
            Some(op) if !op.is_terminal() => Ok(Some(op)),
            Some(op) => {
                debug!(operation_id = %op.id, status = %op.status, "last bulk operation already finished");
                Ok(None)
            }
            None => {
                debug!("no bulk operation on record");
                Ok(None)
            }
        }
    }

    async fn settle(&self, running: &BulkOperation) -> Result<BulkOperation, SourcingError> {
        let settled = self
            .poller
            .await_completion(&running.id, |status, object_count| {
                debug!(operation_id = %running.id, %status, object_count, "waiting for operation to settle");
            })
            .await?;
        info!(operation_id = %settled.id, status = %settled.status, "previous bulk operation settled");
        Ok(settled)
    }
}
