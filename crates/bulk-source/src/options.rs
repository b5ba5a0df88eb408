use std::fmt;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 3600;
const DEFAULT_MAX_CANCEL_RETRIES: u32 = 3;
const DEFAULT_TYPE_PREFIX: &str = "Shopify";

/// Secret used to authenticate against the store. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(***)")
    }
}

/// What to do with a job that is still running when a run begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleOperationPolicy {
    /// Cancel it and wait until it settles.
    #[default]
    Cancel,
    /// Let it finish on its own and wait for it.
    AwaitFinish,
}

/// Options for one sourcing run. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct SourcingOptions {
    pub store: String,
    pub credentials: Credentials,
    pub download_images: bool,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    /// How many times a job canceled by someone else is restarted.
    pub max_cancel_retries: u32,
    pub stale_operation: StaleOperationPolicy,
    pub type_prefix: String,
}

impl SourcingOptions {
    pub fn new(store: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            store: store.into(),
            credentials,
            download_images: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            max_cancel_retries: DEFAULT_MAX_CANCEL_RETRIES,
            stale_operation: StaleOperationPolicy::default(),
            type_prefix: DEFAULT_TYPE_PREFIX.to_owned(),
        }
    }

    pub fn with_download_images(mut self, enabled: bool) -> Self {
        self.download_images = enabled;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Clamped to at least one attempt.
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts.max(1);
        self
    }

    pub fn with_max_cancel_retries(mut self, retries: u32) -> Self {
        self.max_cancel_retries = retries;
        self
    }

    pub fn with_stale_operation(mut self, policy: StaleOperationPolicy) -> Self {
        self.stale_operation = policy;
        self
    }

    pub fn with_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_prefix = prefix.into();
        self
    }
}
