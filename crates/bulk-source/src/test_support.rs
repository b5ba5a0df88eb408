//! In-memory doubles for the collaborator traits.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::{StreamExt, stream};
use serde_json::Value;

use crate::{
    ActivityTimer, BulkOperation, ByteStream, ClientError, ContentNode, Delay, FileId, Host, HostError,
    MaterializeError, MediaMaterializer, OperationClient, OperationId, PluginError, Reporter,
    ResultFetcher,
};

/// A call observed by [`ScriptedClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    Start(String),
    Cancel(OperationId),
    Current,
    ById(OperationId),
}

/// Queue of scripted responses. The last entry keeps answering once the
/// earlier ones are used up.
struct Script<T> {
    responses: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            responses: VecDeque::new(),
        }
    }

    fn next(&mut self) -> Option<T> {
        if self.responses.len() > 1 {
            self.responses.pop_front()
        } else {
            self.responses.front().cloned()
        }
    }
}

/// Operation client answering from per-endpoint scripts.
pub struct ScriptedClient {
    start: Mutex<Script<Result<BulkOperation, ClientError>>>,
    cancel: Mutex<Script<Result<BulkOperation, ClientError>>>,
    current: Mutex<Script<Result<Option<BulkOperation>, ClientError>>>,
    by_id: Mutex<Script<Result<BulkOperation, ClientError>>>,
    calls: Mutex<Vec<ClientCall>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            start: Mutex::new(Script::new()),
            cancel: Mutex::new(Script::new()),
            current: Mutex::new(Script::new()),
            by_id: Mutex::new(Script::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_start(&self, response: Result<BulkOperation, ClientError>) {
        self.start.lock().unwrap().responses.push_back(response);
    }

    pub fn push_cancel(&self, response: Result<BulkOperation, ClientError>) {
        self.cancel.lock().unwrap().responses.push_back(response);
    }

    pub fn push_current(&self, response: Result<Option<BulkOperation>, ClientError>) {
        self.current.lock().unwrap().responses.push_back(response);
    }

    pub fn push_by_id(&self, response: Result<BulkOperation, ClientError>) {
        self.by_id.lock().unwrap().responses.push_back(response);
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&ClientCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: ClientCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

fn unscripted(endpoint: &str) -> ClientError {
    ClientError::Malformed(format!("no scripted response for {endpoint}"))
}

#[async_trait::async_trait]
impl OperationClient for ScriptedClient {
    async fn start(&self, query: &str) -> Result<BulkOperation, ClientError> {
        self.record(ClientCall::Start(query.to_owned()));
        self.start
            .lock()
            .unwrap()
            .next()
            .unwrap_or_else(|| Err(unscripted("start")))
    }

    async fn cancel(&self, id: &OperationId) -> Result<BulkOperation, ClientError> {
        self.record(ClientCall::Cancel(id.clone()));
        self.cancel
            .lock()
            .unwrap()
            .next()
            .unwrap_or_else(|| Err(unscripted("cancel")))
    }

    async fn current(&self) -> Result<Option<BulkOperation>, ClientError> {
        self.record(ClientCall::Current);
        self.current.lock().unwrap().next().unwrap_or(Ok(None))
    }

    async fn by_id(&self, id: &OperationId) -> Result<BulkOperation, ClientError> {
        self.record(ClientCall::ById(id.clone()));
        self.by_id
            .lock()
            .unwrap()
            .next()
            .unwrap_or_else(|| Err(unscripted("by_id")))
    }
}

/// Result fetcher serving fixed bodies by URL.
#[derive(Default)]
pub struct StaticResultFetcher {
    bodies: Mutex<HashMap<String, Vec<Bytes>>>,
    fetched: Mutex<Vec<String>>,
}

impl StaticResultFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` in one chunk.
    pub fn insert(&self, url: impl Into<String>, body: impl Into<String>) {
        let body: String = body.into();
        self.bodies
            .lock()
            .unwrap()
            .insert(url.into(), vec![Bytes::from(body)]);
    }

    /// Serve the body as the given chunks, in order.
    pub fn insert_chunked(&self, url: impl Into<String>, chunks: &[&str]) {
        let chunks = chunks
            .iter()
            .map(|chunk| Bytes::copy_from_slice(chunk.as_bytes()))
            .collect();
        self.bodies.lock().unwrap().insert(url.into(), chunks);
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ResultFetcher for StaticResultFetcher {
    async fn fetch(&self, url: &str) -> Result<ByteStream, ClientError> {
        self.fetched.lock().unwrap().push(url.to_owned());
        let chunks = self
            .bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ClientError::Network(format!("HTTP 404 for {url}")))?;
        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }
}

/// Everything a [`RecordingReporter`] was told.
#[derive(Debug, Default, Clone)]
pub struct ReporterLog {
    pub infos: Vec<String>,
    pub warnings: Vec<String>,
    pub fatals: Vec<PluginError>,
    pub timers_started: Vec<String>,
    pub timers_ended: Vec<String>,
    pub statuses: Vec<String>,
}

#[derive(Default, Clone)]
pub struct RecordingReporter {
    log: Arc<Mutex<ReporterLog>>,
}

impl RecordingReporter {
    pub fn log(&self) -> ReporterLog {
        self.log.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn info(&self, message: &str) {
        self.log.lock().unwrap().infos.push(message.to_owned());
    }

    fn warn(&self, message: &str) {
        self.log.lock().unwrap().warnings.push(message.to_owned());
    }

    fn fatal(&self, error: PluginError) {
        self.log.lock().unwrap().fatals.push(error);
    }

    fn activity_timer(&self, name: &str) -> Box<dyn ActivityTimer> {
        Box::new(RecordingTimer {
            name: name.to_owned(),
            log: Arc::clone(&self.log),
        })
    }
}

struct RecordingTimer {
    name: String,
    log: Arc<Mutex<ReporterLog>>,
}

impl ActivityTimer for RecordingTimer {
    fn start(&mut self) {
        self.log.lock().unwrap().timers_started.push(self.name.clone());
    }

    fn set_status(&mut self, status: &str) {
        self.log.lock().unwrap().statuses.push(status.to_owned());
    }

    fn end(&mut self) {
        self.log.lock().unwrap().timers_ended.push(self.name.clone());
    }
}

/// Host that keeps every node and cache write in memory.
///
/// Node ids are `node:<seed>`; digests are the length of the serialized
/// content, which is enough to tell records apart in tests.
#[derive(Default)]
pub struct RecordingHost {
    nodes: Mutex<Vec<ContentNode>>,
    cache: Mutex<Vec<(String, Value)>>,
    reporter: RecordingReporter,
    reject_nodes: bool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose `create_node` always fails.
    pub fn rejecting_nodes() -> Self {
        Self {
            reject_nodes: true,
            ..Self::default()
        }
    }

    pub fn nodes(&self) -> Vec<ContentNode> {
        self.nodes.lock().unwrap().clone()
    }

    pub fn cache_entries(&self) -> Vec<(String, Value)> {
        self.cache.lock().unwrap().clone()
    }

    pub fn log(&self) -> ReporterLog {
        self.reporter.log()
    }
}

#[async_trait::async_trait]
impl Host for RecordingHost {
    fn create_node_id(&self, seed: &str) -> String {
        format!("node:{seed}")
    }

    fn content_digest(&self, content: &Value) -> String {
        format!("len:{}", content.to_string().len())
    }

    async fn create_node(&self, node: ContentNode) -> Result<(), HostError> {
        if self.reject_nodes {
            return Err(HostError::NodeRejected(node.shopify_id.to_string()));
        }
        self.nodes.lock().unwrap().push(node);
        Ok(())
    }

    async fn cache_set(&self, key: &str, value: Value) -> Result<(), HostError> {
        self.cache.lock().unwrap().push((key.to_owned(), value));
        Ok(())
    }

    fn reporter(&self) -> &dyn Reporter {
        &self.reporter
    }
}

/// Materializer returning a fixed file id, with optional per-URL failures.
pub struct FakeMaterializer {
    file_id: String,
    failures: Mutex<HashMap<String, String>>,
    requested: Mutex<Vec<String>>,
}

impl FakeMaterializer {
    pub fn returning(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            failures: Mutex::new(HashMap::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_for(&self, url: impl Into<String>, reason: impl Into<String>) {
        self.failures.lock().unwrap().insert(url.into(), reason.into());
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaMaterializer for FakeMaterializer {
    async fn materialize(&self, url: &str) -> Result<FileId, MaterializeError> {
        self.requested.lock().unwrap().push(url.to_owned());
        match self.failures.lock().unwrap().get(url) {
            Some(reason) => Err(MaterializeError(reason.clone())),
            None => Ok(FileId::new(self.file_id.clone())),
        }
    }
}

/// Delay that returns immediately and remembers what it was asked to wait.
#[derive(Default)]
pub struct ImmediateDelay {
    waits: Mutex<Vec<Duration>>,
}

impl ImmediateDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Delay for ImmediateDelay {
    async fn wait(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}
