use crate::error::RecordFault;

/// Structured feedback collected during a run.
///
/// Record-level problems end up here instead of being printed, so callers
/// decide how to present them (the CLI prints to stderr, tests inspect them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Informational message.
    Info(String),
    /// The run continued but a record was skipped or degraded.
    Warning(String),
}

impl Feedback {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info(msg) | Self::Warning(msg) => msg,
        }
    }
}

impl From<&RecordFault> for Feedback {
    fn from(fault: &RecordFault) -> Self {
        Self::Warning(fault.to_string())
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(msg) => write!(f, "{msg}"),
            Self::Warning(msg) => write!(f, "warning: {msg}"),
        }
    }
}
