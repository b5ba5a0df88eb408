use std::fmt;

/// Remote-assigned identifier for a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationId(String);

impl OperationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status reported by the remote platform.
///
/// Transitions follow `Created -> Running -> {Completed, Canceling -> Canceled, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationStatus {
    Created,
    Running,
    Completed,
    Canceling,
    Canceled,
    Failed,
}

impl OperationStatus {
    /// Parse the wire representation (`"RUNNING"`, `"COMPLETED"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "RUNNING" => Some(Self::Running),
            "COMPLETED" => Some(Self::Completed),
            "CANCELING" => Some(Self::Canceling),
            "CANCELED" => Some(Self::Canceled),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Canceling => "CANCELING",
            Self::Canceled => "CANCELED",
            Self::Failed => "FAILED",
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Failed)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a remote bulk export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOperation {
    pub id: OperationId,
    pub status: OperationStatus,
    pub object_count: u64,
    pub query: String,
    pub url: Option<String>,
    pub error_code: Option<String>,
}

impl BulkOperation {
    pub fn new(id: impl Into<String>, status: OperationStatus) -> Self {
        Self {
            id: OperationId::new(id),
            status,
            object_count: 0,
            query: String::new(),
            url: None,
            error_code: None,
        }
    }

    pub fn with_object_count(mut self, count: u64) -> Self {
        self.object_count = count;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
