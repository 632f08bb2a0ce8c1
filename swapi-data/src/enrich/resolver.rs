use serde_json::Value;

use super::FetchError;
use crate::source::ResourceSource;

/// Separator placed between resolved reference values.
pub const REFERENCE_SEPARATOR: &str = ", ";

/// Resolve cross-reference URLs into a single display string.
///
/// Each URL is fetched in turn, in input order, and `field` is read from the
/// returned document. The values are joined with [`REFERENCE_SEPARATOR`].
/// An empty list resolves to the empty string without touching the network.
///
/// # Errors
///
/// Any transport failure, including a `404` for a referenced resource, is
/// returned as-is. A document without a string `field` yields
/// [`FetchError::MissingField`].
///
/// # Examples
/// ```
/// use serde_json::json;
/// use swapi_data::enrich::resolve_references;
/// use swapi_data::source::test_support::StubResourceSource;
///
/// let source = StubResourceSource::default()
///     .with_document("https://swapi.test/api/films/1/", json!({ "title": "A New Hope" }))
///     .with_document("https://swapi.test/api/films/6/", json!({ "title": "Return of the Jedi" }));
/// let titles = tokio::runtime::Builder::new_current_thread()
///     .build()
///     .expect("create Tokio runtime")
///     .block_on(resolve_references(
///         &source,
///         ["https://swapi.test/api/films/1/", "https://swapi.test/api/films/6/"],
///         "title",
///     ))?;
/// assert_eq!(titles, "A New Hope, Return of the Jedi");
/// # Ok::<(), swapi_data::enrich::FetchError>(())
/// ```
pub async fn resolve_references<S, I>(
    source: &S,
    urls: I,
    field: &str,
) -> Result<String, FetchError>
where
    S: ResourceSource + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut values = Vec::new();
    for url in urls {
        let url = url.as_ref();
        let document = source.fetch_json(url).await?;
        let value = document
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::MissingField {
                url: url.to_owned(),
                field: field.to_owned(),
            })?;
        values.push(value.to_owned());
    }
    Ok(values.join(REFERENCE_SEPARATOR))
}
