use std::path::PathBuf;
use std::time::Duration;

use bulk_source::{Credentials, SourcingOptions, StaleOperationPolicy};
use bulk_source_shopify::ShopifyClientConfig;
use serde::{Deserialize, Deserializer, Serialize};

/// Environment variable that overrides `access_token` from the file.
pub const ACCESS_TOKEN_ENV: &str = "SHOPIFY_ADMIN_ACCESS_TOKEN";

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Store domain, e.g. `my-shop.myshopify.com`.
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// At least 1.
    #[serde(
        default = "default_max_poll_attempts",
        deserialize_with = "at_least_one"
    )]
    pub max_poll_attempts: u32,
    #[serde(default = "default_max_cancel_retries")]
    pub max_cancel_retries: u32,
    #[serde(default)]
    pub download_images: bool,
    #[serde(default)]
    pub stale_operation: StalePolicy,
    #[serde(default = "default_type_prefix")]
    pub type_prefix: String,
    /// Extra jobs on top of the built-in ones. A job with a built-in name
    /// replaces it.
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

/// What to do with a bulk operation that is still running when a job starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    #[default]
    Cancel,
    AwaitFinish,
}

impl From<StalePolicy> for StaleOperationPolicy {
    fn from(policy: StalePolicy) -> Self {
        match policy {
            StalePolicy::Cancel => Self::Cancel,
            StalePolicy::AwaitFinish => Self::AwaitFinish,
        }
    }
}

/// A user-defined bulk query.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobEntry {
    pub name: String,
    pub query: String,
}

fn default_api_version() -> String {
    "2024-01".into()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_max_poll_attempts() -> u32 {
    3_600
}

fn at_least_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match u32::deserialize(deserializer)? {
        0 => Err(serde::de::Error::custom("must be at least 1")),
        n => Ok(n),
    }
}

fn default_max_cancel_retries() -> u32 {
    3
}

fn default_type_prefix() -> String {
    "Shopify".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: None,
            access_token: None,
            api_version: default_api_version(),
            api_base_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            max_cancel_retries: default_max_cancel_retries(),
            download_images: false,
            stale_operation: StalePolicy::default(),
            type_prefix: default_type_prefix(),
            jobs: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Token from `env_token` if set, otherwise from the file.
    pub fn credentials(&self, env_token: Option<String>) -> Option<Credentials> {
        env_token
            .filter(|t| !t.is_empty())
            .or_else(|| self.access_token.clone())
            .map(Credentials::new)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn client_config(&self, store: &str, credentials: Credentials) -> ShopifyClientConfig {
        let mut config = ShopifyClientConfig::new(store, credentials);
        config.api_version = self.api_version.clone();
        config.api_base_url = self.api_base_url.clone();
        config.request_timeout = self.request_timeout();
        config
    }

    pub fn sourcing_options(&self, store: &str, credentials: Credentials) -> SourcingOptions {
        SourcingOptions::new(store, credentials)
            .with_download_images(self.download_images)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_max_poll_attempts(self.max_poll_attempts)
            .with_max_cancel_retries(self.max_cancel_retries)
            .with_stale_operation(self.stale_operation.into())
            .with_type_prefix(self.type_prefix.clone())
    }
}

/// Config file path: `~/.config/bulk-source/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bulk-source").join("config.toml"))
}

/// Load config from file, falling back to defaults if missing.
pub fn load_config() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => return config,
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config, using defaults"
            ),
        }
    }

    AppConfig::default()
}
