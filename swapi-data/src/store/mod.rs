//! SQLite persistence for enriched people.
//!
//! - [`schema`] drops and recreates the `swapi_people` table.
//! - [`persistence`] writes batches of people inside one transaction and
//!   exposes [`SqlitePersonStore`], the [`swapi_core::PersonSink`] used by the
//!   loader.
#![forbid(unsafe_code)]

mod persistence;
mod schema;

pub use persistence::{PersistError, SqlitePersonStore, persist_people};
pub use schema::{PEOPLE_COLUMNS, PEOPLE_TABLE, SchemaError, reset_schema};
