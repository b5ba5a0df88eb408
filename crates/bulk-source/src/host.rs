use serde_json::Value;

use crate::classify::PluginError;
use crate::record::ContentNode;

/// Errors raised by the host while accepting nodes or cache writes.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("node rejected: {0}")]
    NodeRejected(String),

    #[error("cache write failed: {0}")]
    Cache(String),
}

/// Named progress indicator for a long-running step.
pub trait ActivityTimer: Send {
    fn start(&mut self);
    fn set_status(&mut self, status: &str);
    fn end(&mut self);
}

/// Sink for human-facing messages and the single fatal report of a run.
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);

    /// Report a run-level failure. Called at most once per run.
    fn fatal(&self, error: PluginError);

    fn activity_timer(&self, name: &str) -> Box<dyn ActivityTimer>;
}

/// Capabilities the hosting application lends to a sourcing run.
#[async_trait::async_trait]
pub trait Host: Send + Sync {
    /// Derive a stable node id from a seed (the remote global id).
    fn create_node_id(&self, seed: &str) -> String;

    fn content_digest(&self, content: &Value) -> String;

    /// Take ownership of a finished node.
    async fn create_node(&self, node: ContentNode) -> Result<(), HostError>;

    async fn cache_set(&self, key: &str, value: Value) -> Result<(), HostError>;

    fn reporter(&self) -> &dyn Reporter;
}
