use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bulk_source::{ActivityTimer, ContentNode, Host, HostError, PluginError, Reporter};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Host that writes nodes as JSON lines and keeps its cache in a JSON file.
pub struct FileHost {
    output: Mutex<Box<dyn Write + Send>>,
    cache_path: PathBuf,
    cache: tokio::sync::Mutex<Map<String, Value>>,
    reporter: ConsoleReporter,
}

impl FileHost {
    pub fn new(output: Box<dyn Write + Send>, cache_path: PathBuf) -> Self {
        let cache = read_cache(&cache_path);
        Self {
            output: Mutex::new(output),
            cache_path,
            cache: tokio::sync::Mutex::new(cache),
            reporter: ConsoleReporter,
        }
    }

    /// Nodes go to `output`, or to stdout when `None`.
    pub fn open(output: Option<&Path>, cache_path: PathBuf) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create output directory: {}", parent.display())
                    })?;
                }
                let file = std::fs::File::create(path)
                    .with_context(|| format!("failed to create output file: {}", path.display()))?;
                Box::new(std::io::BufWriter::new(file))
            }
            None => Box::new(std::io::stdout()),
        };
        Ok(Self::new(writer, cache_path))
    }

    /// Flush any buffered node output.
    pub fn finish(&self) -> Result<()> {
        let mut output = self
            .output
            .lock()
            .map_err(|_| anyhow::anyhow!("node output lock poisoned"))?;
        output.flush().context("failed to flush node output")
    }
}

/// Last-operation cache as stored on disk. A missing or unreadable file is
/// an empty cache.
pub fn read_cache(path: &Path) -> Map<String, Value> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|contents| serde_json::from_str(&contents).ok())
        .unwrap_or_default()
}

#[async_trait]
impl Host for FileHost {
    fn create_node_id(&self, seed: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes()).to_string()
    }

    fn content_digest(&self, content: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    async fn create_node(&self, node: ContentNode) -> Result<(), HostError> {
        let line = serde_json::to_string(&node)
            .map_err(|e| HostError::NodeRejected(format!("{}: {e}", node.shopify_id)))?;

        let mut output = self
            .output
            .lock()
            .map_err(|_| HostError::NodeRejected("node output lock poisoned".into()))?;
        writeln!(output, "{line}")
            .map_err(|e| HostError::NodeRejected(format!("{}: {e}", node.shopify_id)))
    }

    async fn cache_set(&self, key: &str, value: Value) -> Result<(), HostError> {
        let mut cache = self.cache.lock().await;
        cache.insert(key.to_owned(), value);

        let contents = serde_json::to_string_pretty(&*cache)
            .map_err(|e| HostError::Cache(e.to_string()))?;
        if let Some(parent) = self.cache_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HostError::Cache(format!("{}: {e}", parent.display())))?;
        }
        tokio::fs::write(&self.cache_path, contents)
            .await
            .map_err(|e| HostError::Cache(format!("{}: {e}", self.cache_path.display())))
    }

    fn reporter(&self) -> &dyn Reporter {
        &self.reporter
    }
}

/// Prints human-facing messages to stderr.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn info(&self, message: &str) {
        eprintln!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn fatal(&self, error: PluginError) {
        eprintln!("error [{}]: {}", error.code, error.context_message);
    }

    fn activity_timer(&self, name: &str) -> Box<dyn ActivityTimer> {
        Box::new(ConsoleTimer {
            name: name.to_owned(),
            started: None,
            last_status: None,
        })
    }
}

struct ConsoleTimer {
    name: String,
    started: Option<Instant>,
    last_status: Option<String>,
}

impl ActivityTimer for ConsoleTimer {
    fn start(&mut self) {
        self.started = Some(Instant::now());
        eprintln!("{}: started", self.name);
    }

    fn set_status(&mut self, status: &str) {
        // Polling repeats the same status many times.
        if self.last_status.as_deref() == Some(status) {
            return;
        }
        eprintln!("{}: {}", self.name, status.replace('\n', " | "));
        self.last_status = Some(status.to_owned());
    }

    fn end(&mut self) {
        match self.started.take() {
            Some(started) => eprintln!(
                "{}: finished in {:.1}s",
                self.name,
                started.elapsed().as_secs_f64()
            ),
            None => eprintln!("{}: finished", self.name),
        }
    }
}
