//! Data access and loading logic for the SWAPI people loader.
//!
//! Responsibilities:
//! - Fetch person resources over HTTP and resolve their cross-references.
//! - Drive identifiers through the fetcher with bounded concurrency.
//! - Persist regrouped batches to SQLite from independent tasks.
//!
//! Boundaries:
//! - Domain types and the regrouping stage live in `swapi-core`.
//! - Keep blocking SQLite work off the async executor thread.
//!
//! Invariants:
//! - At most `concurrency` person fetches are in flight at once.
//! - Absent identifiers are never persisted.
//! - No global mutable state.
#![forbid(unsafe_code)]

pub mod dispatch;
pub mod enrich;
pub mod pipeline;
pub mod source;
pub mod store;

pub use dispatch::{DispatchError, DispatchSummary, Dispatcher};
pub use enrich::{FetchError, fetch_person, produce_people, resolve_references};
pub use pipeline::{LoadReport, PipelineError, PipelineOptions, run_pipeline};
pub use source::{
    BaseUrl, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HttpResourceSource, HttpSourceConfig,
    ResourceSource, ResourceUrl, SourceBuildError, TransportError,
};
pub use store::{PersistError, SchemaError, SqlitePersonStore, persist_people, reset_schema};
