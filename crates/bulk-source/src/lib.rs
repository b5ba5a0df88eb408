pub mod canceller;
pub mod classify;
pub mod client;
pub mod delay;
pub mod error;
pub mod feedback;
pub mod global_id;
pub mod host;
pub mod ingest;
pub mod job;
pub mod media;
pub mod operation;
pub mod options;
pub mod orchestrator;
pub mod poller;
pub mod record;

pub use canceller::OperationCanceller;
pub use classify::{Disposition, PluginError, PluginErrorCode};
pub use client::{ByteStream, ClientError, OperationClient, ResultFetcher};
pub use delay::{Delay, TokioDelay};
pub use error::{DecodeError, RecordFault, SourcingError};
pub use feedback::Feedback;
pub use global_id::GlobalId;
pub use host::{ActivityTimer, Host, HostError, Reporter};
pub use ingest::{ResultIngester, ResultLines};
pub use job::{JobCreator, QueryJob};
pub use media::{MaterializeError, MediaError, MediaMaterializer, MediaResolver};
pub use operation::{BulkOperation, OperationId, OperationStatus};
pub use options::{Credentials, SourcingOptions, StaleOperationPolicy};
pub use orchestrator::{RunReport, SourcingOrchestrator};
pub use poller::OperationPoller;
pub use record::{ContentNode, FileId, ResultRecord};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
