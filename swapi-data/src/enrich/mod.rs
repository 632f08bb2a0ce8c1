//! Fetching and enrichment of person records.
//!
//! - [`resolve_references`] turns a list of cross-reference URLs into one
//!   display string.
//! - [`fetch_person`] loads a person resource and resolves every reference
//!   field, returning `None` for identifiers the API does not know.
//! - [`produce_people`] drives identifiers through the fetcher in fixed-width
//!   windows and exposes the results as a lazy stream.
#![forbid(unsafe_code)]

mod fetcher;
mod producer;
mod resolver;

use thiserror::Error;

use crate::source::TransportError;

pub use fetcher::fetch_person;
pub use producer::produce_people;
pub use resolver::{REFERENCE_SEPARATOR, resolve_references};

/// Errors raised while fetching or enriching a person.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport failed or answered with an error status.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The person document did not have the expected shape.
    #[error("unexpected person document at {url}")]
    Decode {
        /// URL of the offending document.
        url: String,
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },
    /// A referenced resource lacked the requested string field.
    #[error("resource {url} has no string field {field:?}")]
    MissingField {
        /// URL of the referenced resource.
        url: String,
        /// Field that was requested.
        field: String,
    },
}
