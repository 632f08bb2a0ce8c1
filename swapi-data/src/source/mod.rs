//! Transport seam for fetching JSON resources from the upstream API.
//!
//! [`ResourceSource`] abstracts a single-attempt JSON `GET`. The production
//! implementation, [`HttpResourceSource`], shares one `reqwest` client across
//! every request so connections are reused. Tests substitute
//! [`test_support::StubResourceSource`], which serves canned documents.
//!
//! # Example
//!
//! ```no_run
//! use swapi_core::PersonId;
//! use swapi_data::source::{HttpResourceSource, ResourceSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = HttpResourceSource::new("https://swapi.dev/api/people")?;
//! let url = source.person_url(PersonId::new(1)?);
//! assert_eq!(url.as_ref(), "https://swapi.dev/api/people/1/");
//! let body = source.fetch_json(&url).await?;
//! println!("{}", body["name"]);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod error;
mod http;
mod types;

#[doc(hidden)]
pub mod test_support;

use async_trait::async_trait;
use serde_json::Value;
use swapi_core::PersonId;

pub use error::{SourceBuildError, TransportError};
pub use http::{DEFAULT_USER_AGENT, HttpResourceSource, HttpSourceConfig};
pub use types::{BaseUrl, DEFAULT_BASE_URL, ResourceUrl};

/// Read-only access to JSON resources of the upstream API.
#[async_trait(?Send)]
pub trait ResourceSource {
    /// Collection URL person identifiers are appended to.
    fn base_url(&self) -> &BaseUrl;

    /// URL of the person resource identified by `id`.
    ///
    /// The format is `{base_url}/{id}/`.
    fn person_url(&self, id: PersonId) -> ResourceUrl {
        ResourceUrl::new(format!("{}/{id}/", self.base_url()))
    }

    /// Issue one `GET` for `url` and decode the body as JSON.
    ///
    /// Non-success statuses surface as [`TransportError::Http`]; callers use
    /// [`TransportError::is_not_found`] to treat missing resources as absent.
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError>;
}
