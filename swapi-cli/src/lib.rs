//! Command-line interface for loading SWAPI people into SQLite.
#![forbid(unsafe_code)]

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use swapi_core::{IdRange, PersonId, PersonSink};
use swapi_data::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HttpResourceSource, HttpSourceConfig, LoadReport,
    PipelineOptions, ResourceSource, SqlitePersonStore, run_pipeline,
};
use tracing_subscriber::EnvFilter;

mod error;

pub use error::CliError;

const ARG_FIRST_ID: &str = "first-id";
const ARG_LAST_ID: &str = "last-id";
const ARG_CONCURRENCY: &str = "concurrency";
const ARG_BATCH_SIZE: &str = "batch-size";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ENV_FIRST_ID: &str = "SWAPI_CMDS_LOAD_FIRST_ID";
const ENV_LAST_ID: &str = "SWAPI_CMDS_LOAD_LAST_ID";
const ENV_CONCURRENCY: &str = "SWAPI_CMDS_LOAD_CONCURRENCY";
const ENV_BATCH_SIZE: &str = "SWAPI_CMDS_LOAD_BATCH_SIZE";
const ENV_TIMEOUT_SECS: &str = "SWAPI_CMDS_LOAD_TIMEOUT_SECS";

const DEFAULT_DATABASE: &str = "swapi.db";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FILTER: &str = "info";

/// Run the loader CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    init_logging();
    match cli.command {
        Command::Load(args) => {
            let config = args.into_config()?;
            let started = Instant::now();
            let report = run_load(&config)?;
            println!("{}", summary_line(&report, started.elapsed()));
        }
    }
    Ok(())
}

/// Install the fmt subscriber; `RUST_LOG` overrides the default filter.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Keep an already installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_load(config: &LoadConfig) -> Result<LoadReport, CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let source = HttpResourceSource::with_config(config.source.clone()).map_err(|source| {
        CliError::BuildSource {
            base_url: config.source.base_url.to_string(),
            source,
        }
    })?;
    let store = open_store(config)?;
    runtime.block_on(execute(config, &source, store))
}

fn open_store(config: &LoadConfig) -> Result<SqlitePersonStore, CliError> {
    SqlitePersonStore::open(&config.database).map_err(|source| CliError::OpenStore {
        path: config.database.clone(),
        source,
    })
}

async fn execute<S, K>(config: &LoadConfig, source: &S, sink: K) -> Result<LoadReport, CliError>
where
    S: ResourceSource + ?Sized,
    K: PersonSink,
{
    info!(
        "loading people from {} into {}",
        source.base_url(),
        config.database
    );
    let report = run_pipeline(source, Arc::new(sink), &config.pipeline).await?;
    Ok(report)
}

fn summary_line(report: &LoadReport, elapsed: Duration) -> String {
    format!(
        "Loaded {} people ({} absent) in {elapsed:.2?}",
        report.persisted,
        report.absent()
    )
}

#[derive(Debug, Parser)]
#[command(
    name = "swapi-loader",
    about = "Load Star Wars API people into a SQLite database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch, enrich, and persist a range of people.
    Load(LoadArgs),
}

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "load",
    long_about = "Fetch people from the Star Wars API, resolve their film, \
                 planet, species, starship, and vehicle references, and \
                 write them to SQLite. Settings can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Load a range of people into SQLite"
)]
#[ortho_config(prefix = "SWAPI")]
struct LoadArgs {
    /// SQLite database to (re)create.
    #[arg(long, value_name = "path")]
    #[serde(default)]
    database: Option<Utf8PathBuf>,
    /// Collection URL for person resources.
    #[arg(long, value_name = "url")]
    #[serde(default)]
    base_url: Option<String>,
    /// First person id to load.
    #[arg(long = ARG_FIRST_ID, value_name = "id")]
    #[serde(default)]
    first_id: Option<u32>,
    /// Last person id to load (inclusive).
    #[arg(long = ARG_LAST_ID, value_name = "id")]
    #[serde(default)]
    last_id: Option<u32>,
    /// People fetched concurrently per window.
    #[arg(long = ARG_CONCURRENCY, value_name = "count")]
    #[serde(default)]
    concurrency: Option<usize>,
    /// People committed per transaction.
    #[arg(long = ARG_BATCH_SIZE, value_name = "count")]
    #[serde(default)]
    batch_size: Option<usize>,
    /// Outstanding persistence tasks before the producer waits; 0 disables the cap.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    max_pending_batches: Option<usize>,
    /// User agent sent with every request.
    #[arg(long, value_name = "agent")]
    #[serde(default)]
    user_agent: Option<String>,
    /// HTTP connect and request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl LoadArgs {
    fn into_config(self) -> Result<LoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LoadConfig::try_from(merged)
    }
}

#[derive(Debug, Clone)]
struct LoadConfig {
    database: Utf8PathBuf,
    source: HttpSourceConfig,
    pipeline: PipelineOptions,
}

impl LoadConfig {
    fn person_id(
        value: Option<u32>,
        fallback: PersonId,
        field: &'static str,
        env: &'static str,
    ) -> Result<PersonId, CliError> {
        value.map_or(Ok(fallback), |raw| {
            PersonId::new(raw).map_err(|_| CliError::ZeroSetting { field, env })
        })
    }

    fn positive(
        value: Option<usize>,
        fallback: NonZeroUsize,
        field: &'static str,
        env: &'static str,
    ) -> Result<NonZeroUsize, CliError> {
        value.map_or(Ok(fallback), |raw| {
            NonZeroUsize::new(raw).ok_or(CliError::ZeroSetting { field, env })
        })
    }
}

impl TryFrom<LoadArgs> for LoadConfig {
    type Error = CliError;

    fn try_from(args: LoadArgs) -> Result<Self, Self::Error> {
        let defaults = PipelineOptions::default();
        let first = Self::person_id(args.first_id, defaults.ids.first(), ARG_FIRST_ID, ENV_FIRST_ID)?;
        let last = Self::person_id(args.last_id, defaults.ids.last(), ARG_LAST_ID, ENV_LAST_ID)?;
        let ids = IdRange::new(first, last)?;
        let concurrency = Self::positive(
            args.concurrency,
            defaults.concurrency,
            ARG_CONCURRENCY,
            ENV_CONCURRENCY,
        )?;
        let batch_size = Self::positive(
            args.batch_size,
            defaults.batch_size,
            ARG_BATCH_SIZE,
            ENV_BATCH_SIZE,
        )?;
        let max_pending = args
            .max_pending_batches
            .map_or(defaults.max_pending_batches, NonZeroUsize::new);
        let timeout_secs = args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CliError::ZeroSetting {
                field: ARG_TIMEOUT_SECS,
                env: ENV_TIMEOUT_SECS,
            });
        }

        let source = HttpSourceConfig::new(args.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()))
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_user_agent(args.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()));
        let pipeline = PipelineOptions::default()
            .with_ids(ids)
            .with_concurrency(concurrency)
            .with_batch_size(batch_size)
            .with_max_pending_batches(max_pending);
        Ok(Self {
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            source,
            pipeline,
        })
    }
}

#[cfg(test)]
mod tests;
