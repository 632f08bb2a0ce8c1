//! Test utilities for resource sources.
//!
//! [`StubResourceSource`] is a deterministic stand-in for the upstream API.
//! It serves canned JSON documents, answers `404` for unknown URLs, and
//! records how many requests were in flight at once so tests can assert the
//! producer's concurrency bound.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{BaseUrl, ResourceSource, TransportError};

/// Base URL used by [`StubResourceSource::default`].
pub const STUB_BASE_URL: &str = "https://swapi.test/api/people";

/// Film references attached by [`StubResourceSource::with_person`].
pub const FILM_URLS: [&str; 2] = [
    "https://swapi.test/api/films/1/",
    "https://swapi.test/api/films/2/",
];

/// Homeworld reference attached by [`StubResourceSource::with_person`].
pub const PLANET_URL: &str = "https://swapi.test/api/planets/1/";

/// Starship reference attached by [`StubResourceSource::with_person`].
pub const STARSHIP_URL: &str = "https://swapi.test/api/starships/12/";

/// Stub [`ResourceSource`] backed by in-memory documents.
#[derive(Debug)]
pub struct StubResourceSource {
    base_url: BaseUrl,
    documents: HashMap<String, Value>,
    failures: HashSet<String>,
    requests: RefCell<Vec<String>>,
    in_flight: Cell<usize>,
    peak_in_flight: Cell<usize>,
}

impl Default for StubResourceSource {
    fn default() -> Self {
        Self::new(BaseUrl::from(STUB_BASE_URL))
    }
}

impl StubResourceSource {
    /// Construct an empty stub rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            documents: HashMap::new(),
            failures: HashSet::new(),
            requests: RefCell::new(Vec::new()),
            in_flight: Cell::new(0),
            peak_in_flight: Cell::new(0),
        }
    }

    /// Serve `document` for `url`.
    #[must_use]
    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.documents.insert(url.into(), document);
        self
    }

    /// Fail every request for `url` with a network error.
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>) -> Self {
        self.failures.insert(url.into());
        self
    }

    /// Serve a complete person document for `id` plus its references.
    ///
    /// The person appears in two films, lives on Tatooine, pilots one
    /// starship, and has no species or vehicles.
    #[must_use]
    pub fn with_person(self, id: u32, name: &str) -> Self {
        let url = format!("{}/{id}/", self.base_url);
        self.with_document(url, person_document(name))
            .with_document(FILM_URLS[0], json!({ "title": "A New Hope" }))
            .with_document(FILM_URLS[1], json!({ "title": "The Empire Strikes Back" }))
            .with_document(PLANET_URL, json!({ "name": "Tatooine" }))
            .with_document(STARSHIP_URL, json!({ "name": "X-wing" }))
    }

    /// URLs requested so far, in request order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Largest number of requests observed in flight simultaneously.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.get()
    }

    /// Whether a person resource was requested for `id`.
    #[must_use]
    pub fn requested_person(&self, id: u32) -> bool {
        let url = format!("{}/{id}/", self.base_url);
        self.requests.borrow().iter().any(|seen| *seen == url)
    }
}

/// Person document in the upstream wire format.
#[must_use]
pub fn person_document(name: &str) -> Value {
    json!({
        "name": name,
        "birth_year": "19BBY",
        "eye_color": "blue",
        "gender": "male",
        "hair_color": "blond",
        "height": "172",
        "mass": "77",
        "skin_color": "fair",
        "films": FILM_URLS,
        "homeworld": PLANET_URL,
        "species": [],
        "starships": [STARSHIP_URL],
        "vehicles": [],
    })
}

#[async_trait(?Send)]
impl ResourceSource for StubResourceSource {
    fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        self.requests.borrow_mut().push(url.to_owned());
        let active = self.in_flight.get() + 1;
        self.in_flight.set(active);
        self.peak_in_flight.set(self.peak_in_flight.get().max(active));

        // Suspend once so sibling fetches in the same window interleave.
        tokio::task::yield_now().await;

        self.in_flight.set(self.in_flight.get().saturating_sub(1));
        if self.failures.contains(url) {
            return Err(TransportError::Network {
                url: url.to_owned(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "stubbed failure"),
            });
        }
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Http {
                url: url.to_owned(),
                status: 404,
                message: "404 Not Found".to_owned(),
            })
    }
}
