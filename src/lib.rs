//! Facade crate for the SWAPI people loader.
//!
//! This crate re-exports the core domain types and, behind the
//! `store-sqlite` feature, the HTTP source, pipeline driver, and SQLite store.

#![forbid(unsafe_code)]

pub use swapi_core::{
    IdRange, IdRangeError, Person, PersonBatch, PersonId, PersonIdError, PersonSink, Rechunk,
    ReferenceField, present_people, rechunk,
};

#[cfg(feature = "store-sqlite")]
pub use swapi_data::{
    FetchError, HttpResourceSource, HttpSourceConfig, LoadReport, PersistError, PipelineError,
    PipelineOptions, ResourceSource, SqlitePersonStore, TransportError, run_pipeline,
};
