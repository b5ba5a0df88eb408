use crate::client::ClientError;
use crate::host::HostError;
use crate::media::MediaError;
use crate::operation::OperationId;

/// Run-level faults. Any of these ends the run; see [`crate::classify`]
/// for which ones are retried instead.
#[derive(Debug, thiserror::Error)]
pub enum SourcingError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request rejected: {}", .0.join("; "))]
    RequestRejected(Vec<String>),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("bulk operation {id} did not finish after {attempts} polls")]
    PollTimeout { id: OperationId, attempts: u32 },

    #[error(
        "bulk operation {id} failed: {}",
        .error_code.as_deref().unwrap_or("no error code")
    )]
    OperationFailed {
        id: OperationId,
        error_code: Option<String>,
    },

    #[error("bulk operation {id} was canceled by another client")]
    OperationCanceledExternally { id: OperationId },

    #[error("bulk operation {last_id} was canceled externally after {restarts} restarts")]
    RetryBudgetExceeded { last_id: OperationId, restarts: u32 },

    #[error("host error: {0}")]
    Host(#[from] HostError),
}

impl From<ClientError> for SourcingError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(msg) => Self::Network(msg),
            ClientError::Rejected(messages) => Self::RequestRejected(messages),
            ClientError::Malformed(msg) => Self::Malformed(msg),
        }
    }
}

/// A result line that could not be decoded. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("result line {line} could not be decoded: {reason}")]
pub struct DecodeError {
    pub line: usize,
    pub reason: String,
}

/// Record-level faults. Logged and collected; the run continues.
#[derive(Debug, thiserror::Error)]
pub enum RecordFault {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Media(#[from] MediaError),
}
