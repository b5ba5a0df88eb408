use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::operation::{BulkOperation, OperationId};

/// Errors surfaced by a single request/response round trip.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Transport-level fault. The caller decides whether to retry.
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with inline user errors.
    #[error("request rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Request wrapper around the remote bulk operation API.
#[async_trait::async_trait]
pub trait OperationClient: Send + Sync {
    /// Start a bulk export of everything matching `query`.
    async fn start(&self, query: &str) -> Result<BulkOperation, ClientError>;

    /// Request cancellation. The returned operation is usually `CANCELING`.
    async fn cancel(&self, id: &OperationId) -> Result<BulkOperation, ClientError>;

    /// The store's most recent bulk operation, if any.
    async fn current(&self) -> Result<Option<BulkOperation>, ClientError>;

    async fn by_id(&self, id: &OperationId) -> Result<BulkOperation, ClientError>;
}

#[async_trait::async_trait]
impl<T: OperationClient + ?Sized> OperationClient for Arc<T> {
    async fn start(&self, query: &str) -> Result<BulkOperation, ClientError> {
        (**self).start(query).await
    }

    async fn cancel(&self, id: &OperationId) -> Result<BulkOperation, ClientError> {
        (**self).cancel(id).await
    }

    async fn current(&self) -> Result<Option<BulkOperation>, ClientError> {
        (**self).current().await
    }

    async fn by_id(&self, id: &OperationId) -> Result<BulkOperation, ClientError> {
        (**self).by_id(id).await
    }
}

/// Body of a result artifact, chunk by chunk as it arrives.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Downloads a finished operation's result artifact.
#[async_trait::async_trait]
pub trait ResultFetcher: Send + Sync {
    /// GET `url` and stream its body. Fails before any chunk when the
    /// request itself is refused.
    async fn fetch(&self, url: &str) -> Result<ByteStream, ClientError>;
}
