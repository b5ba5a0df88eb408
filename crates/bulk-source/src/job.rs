use crate::client::{ClientError, OperationClient};
use crate::operation::BulkOperation;

/// Creates a new bulk operation. Supplied by the caller; the orchestrator
/// re-invokes it when a started job gets canceled from elsewhere.
#[async_trait::async_trait]
pub trait JobCreator: Send + Sync {
    /// Short name used for progress labels and cache keys.
    fn name(&self) -> &str;

    async fn create(&self, client: &dyn OperationClient) -> Result<BulkOperation, ClientError>;
}

/// A job that starts a bulk export of a fixed query.
#[derive(Debug, Clone)]
pub struct QueryJob {
    name: String,
    query: String,
}

impl QueryJob {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[async_trait::async_trait]
impl JobCreator for QueryJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create(&self, client: &dyn OperationClient) -> Result<BulkOperation, ClientError> {
        client.start(&self.query).await
    }
}
