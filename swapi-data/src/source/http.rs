//! HTTP-backed [`ResourceSource`] built on `reqwest`.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use url::Url;

use super::{BaseUrl, ResourceSource, SourceBuildError, TransportError};

/// Default user agent for upstream requests.
pub const DEFAULT_USER_AGENT: &str = "swapi-loader/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpResourceSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Collection URL for person resources.
    pub base_url: BaseUrl,
    /// Connect and request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: BaseUrl::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpSourceConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: BaseUrl::new(base_url),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP implementation of [`ResourceSource`].
///
/// One client, and therefore one connection pool, is shared by every fetch.
/// Each request is attempted exactly once.
#[derive(Debug)]
pub struct HttpResourceSource {
    client: Client,
    config: HttpSourceConfig,
}

impl HttpResourceSource {
    /// Create a source with default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceBuildError> {
        Self::with_config(HttpSourceConfig::new(base_url))
    }

    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn with_config(config: HttpSourceConfig) -> Result<Self, SourceBuildError> {
        Url::parse(config.base_url.as_ref()).map_err(|source| {
            SourceBuildError::InvalidBaseUrl {
                url: config.base_url.to_string(),
                source,
            }
        })?;
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SourceBuildError::HttpClient)?;
        Ok(Self { client, config })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpSourceConfig {
        &self.config
    }
}

#[async_trait(?Send)]
impl ResourceSource for HttpResourceSource {
    fn base_url(&self) -> &BaseUrl {
        &self.config.base_url
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, self.config.user_agent.as_str())
            .send()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(err, url))?;
        response.json::<Value>().await.map_err(|err| {
            if err.is_decode() {
                TransportError::Decode {
                    url: url.to_owned(),
                    message: err.to_string(),
                }
            } else {
                convert_reqwest_error(err, url)
            }
        })
    }
}

fn convert_reqwest_error(error: reqwest::Error, url: &str) -> TransportError {
    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    TransportError::Network {
        url: url.to_owned(),
        source: io::Error::new(kind, error),
    }
}
