//! Typed wrappers for upstream endpoint and resource URLs.

use std::{fmt, ops::Deref};

/// Default people collection of the public Star Wars API.
pub const DEFAULT_BASE_URL: &str = "https://swapi.dev/api/people";

/// Collection URL that person identifiers are appended to.
///
/// Trailing slashes are trimmed so joined URLs never contain `//`; an empty
/// value falls back to [`DEFAULT_BASE_URL`].
///
/// # Examples
/// ```
/// # use swapi_data::source::BaseUrl;
/// let url = BaseUrl::new("https://swapi.dev/api/people/");
/// assert_eq!(url.as_ref(), "https://swapi.dev/api/people");
/// assert_eq!(BaseUrl::new("").as_ref(), "https://swapi.dev/api/people");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Construct a sanitised [`BaseUrl`].
    pub fn new(value: impl Into<String>) -> Self {
        let raw = value.into();
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            Self(DEFAULT_BASE_URL.to_owned())
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        Self(DEFAULT_BASE_URL.to_owned())
    }
}

impl From<&str> for BaseUrl {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for BaseUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified URL of a single upstream resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUrl(String);

impl ResourceUrl {
    /// Construct a new [`ResourceUrl`] from an owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ResourceUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ResourceUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
