mod commands;
mod config;
mod host;
mod jobs;
mod media;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use bulk_source::{Credentials, SourcingOrchestrator};
use bulk_source_shopify::{HttpResultFetcher, ShopifyOperationClient};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ACCESS_TOKEN_ENV, AppConfig};
use crate::host::FileHost;
use crate::media::DownloadMaterializer;

#[derive(Parser)]
#[command(name = "bulk-source")]
#[command(about = "Export store data through bulk operations and write it out as content nodes")]
struct Cli {
    /// Store domain (overrides the config file)
    #[arg(long, global = true)]
    store: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a bulk export job and write its nodes as JSON lines
    Source {
        /// Job name (see `bulk-source jobs`)
        job: String,
        /// Download images referenced by the results
        #[arg(long)]
        download_images: bool,
        /// Write nodes to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the store's current bulk operation
    Status,
    /// Cancel the store's running bulk operation
    Cancel,
    /// List available jobs
    Jobs,
}

fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("could not determine cache directory")?;
    let dir = base.join("bulk-source");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create cache directory: {}", dir.display()))?;
    Ok(dir)
}

fn operations_cache_path() -> Result<PathBuf> {
    Ok(cache_dir()?.join("operations.json"))
}

fn media_dir() -> Result<PathBuf> {
    Ok(cache_dir()?.join("media"))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bulk_source=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Store and credentials, from flags, environment and config in that order.
fn store_access(cli_store: Option<String>, config: &AppConfig) -> Result<(String, Credentials)> {
    let store = cli_store
        .or_else(|| config.store.clone())
        .context("no store configured; pass --store or set `store` in the config file")?;
    let credentials = config
        .credentials(std::env::var(ACCESS_TOKEN_ENV).ok())
        .with_context(|| {
            format!(
                "no access token configured; set {ACCESS_TOKEN_ENV} or `access_token` in the config file"
            )
        })?;
    Ok((store, credentials))
}

fn build_client(
    config: &AppConfig,
    store: &str,
    credentials: Credentials,
) -> Result<ShopifyOperationClient> {
    ShopifyOperationClient::new(config.client_config(store, credentials))
        .map_err(|e| anyhow::anyhow!("{e}"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let mut app_config = config::load_config();

    match cli.command {
        Command::Jobs => {
            commands::jobs::run(&jobs::all_jobs(&app_config));
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let (store, credentials) = store_access(cli.store, &app_config)?;
            let client = build_client(&app_config, &store, credentials)?;
            let cache = host::read_cache(&operations_cache_path()?);
            commands::status::run(&client, &cache).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Cancel => {
            let (store, credentials) = store_access(cli.store, &app_config)?;
            let client = build_client(&app_config, &store, credentials.clone())?;
            let options = app_config.sourcing_options(&store, credentials);
            commands::cancel::run(&client, &options).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Source {
            job,
            download_images,
            output,
        } => {
            let job = jobs::find_job(&app_config, &job).with_context(|| {
                format!("unknown job `{job}`; run `bulk-source jobs` to list available jobs")
            })?;

            if download_images {
                app_config.download_images = true;
            }

            let (store, credentials) = store_access(cli.store, &app_config)?;
            let client = build_client(&app_config, &store, credentials.clone())?;
            let fetcher = HttpResultFetcher::new(app_config.request_timeout())
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            let host = Arc::new(FileHost::open(output.as_deref(), operations_cache_path()?)?);

            let mut orchestrator = SourcingOrchestrator::new(
                Arc::new(client),
                Arc::new(fetcher),
                host.clone(),
                app_config.sourcing_options(&store, credentials),
            );
            if app_config.download_images {
                let materializer =
                    DownloadMaterializer::new(media_dir()?, app_config.request_timeout())?;
                orchestrator = orchestrator.with_materializer(Arc::new(materializer));
            }

            let outcome = commands::source::run(&orchestrator, &job).await;
            host.finish()?;
            // A failed run was already reported through the host.
            Ok(match outcome {
                Some(_) => ExitCode::SUCCESS,
                None => ExitCode::FAILURE,
            })
        }
    }
}
