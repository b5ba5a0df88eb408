//! Maps run-level faults onto the stable error codes reported to the host,
//! and decides whether a fault halts the run or restarts the job.

use std::fmt;

use crate::error::SourcingError;

/// Remote `errorCode`s that point at the platform rather than at the store.
const PLATFORM_ERROR_CODES: &[&str] = &["INTERNAL_SERVER_ERROR", "TIMEOUT"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginErrorCode {
    BulkOperationFailed,
    /// Catch-all.
    UnknownSourcingFailure,
    UnknownApiError,
    ApiConflict,
}

impl PluginErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BulkOperationFailed => "111000",
            Self::UnknownSourcingFailure => "111001",
            Self::UnknownApiError => "111002",
            Self::ApiConflict => "111003",
        }
    }
}

impl fmt::Display for PluginErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one report handed to the host when a run halts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{code}] {context_message}")]
pub struct PluginError {
    pub code: PluginErrorCode,
    pub context_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Start the job again (subject to the retry budget).
    Retry,
    Halt,
}

pub fn disposition(err: &SourcingError) -> Disposition {
    match err {
        SourcingError::OperationCanceledExternally { .. } => Disposition::Retry,
        _ => Disposition::Halt,
    }
}

pub fn classify(err: &SourcingError) -> PluginError {
    let code = match err {
        SourcingError::RequestRejected(_) => PluginErrorCode::BulkOperationFailed,
        SourcingError::Network(_) | SourcingError::Malformed(_) => PluginErrorCode::UnknownApiError,
        SourcingError::OperationFailed {
            error_code: Some(code),
            ..
        } if PLATFORM_ERROR_CODES.contains(&code.as_str()) => PluginErrorCode::UnknownApiError,
        SourcingError::RetryBudgetExceeded { .. } => PluginErrorCode::ApiConflict,
        _ => PluginErrorCode::UnknownSourcingFailure,
    };

    let detail = match err {
        SourcingError::OperationFailed { error_code, .. } => error_code
            .clone()
            .unwrap_or_else(|| "operation failed without an error code".to_owned()),
        other => other.to_string(),
    };

    PluginError {
        code,
        context_message: format!("Could not source from bulk operation: {detail}"),
    }
}
