//! Error types emitted by the loader CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use swapi_core::IdRangeError;
use swapi_data::{PersistError, PipelineError, SourceBuildError};
use thiserror::Error;

/// Errors emitted by the loader CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// The configured identifier bounds do not form a range.
    #[error("invalid id range: {0}")]
    InvalidIdRange(#[from] IdRangeError),
    /// A setting that must be positive was zero.
    #[error("{field} must be greater than zero (set --{field} or {env})")]
    ZeroSetting {
        field: &'static str,
        env: &'static str,
    },
    /// Preparing the SQLite database failed.
    #[error("failed to prepare database {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: PersistError,
    },
    /// Constructing the HTTP source failed.
    #[error("failed to build HTTP client for {base_url:?}: {source}")]
    BuildSource {
        base_url: String,
        #[source]
        source: SourceBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The load itself failed.
    #[error("load failed: {0}")]
    Pipeline(#[from] PipelineError),
}
