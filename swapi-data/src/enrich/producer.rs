use std::num::NonZeroUsize;

use futures_util::future::try_join_all;
use futures_util::stream::{self, Stream, TryStreamExt};
use log::debug;
use swapi_core::{Person, PersonId};

use super::{FetchError, fetch_person};
use crate::source::ResourceSource;

/// Fetch `ids` in consecutive windows of `width`, yielding results in order.
///
/// Every identifier in a window is fetched concurrently and the window is
/// yielded only once all of its fetches completed, so at most `width`
/// requests for person resources are ever in flight. The next window does
/// not start until the previous one has been yielded. Absent identifiers
/// appear as `Ok(None)`.
///
/// The stream is lazy and single-pass. A failed fetch fails its whole window:
/// the error is yielded once and the stream then ends.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use futures_util::TryStreamExt;
/// use swapi_core::{IdRange, PersonId};
/// use swapi_data::enrich::produce_people;
/// use swapi_data::source::test_support::StubResourceSource;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = StubResourceSource::default()
///     .with_person(1, "Luke Skywalker")
///     .with_person(3, "R2-D2");
/// let ids = IdRange::new(PersonId::new(1)?, PersonId::new(3)?)?;
/// let width = NonZeroUsize::new(2).expect("non-zero width");
///
/// let people: Vec<_> = tokio::runtime::Builder::new_current_thread()
///     .build()?
///     .block_on(produce_people(&source, ids.iter(), width).try_collect())?;
/// let names: Vec<Option<&str>> = people
///     .iter()
///     .map(|p| p.as_ref().map(|p| p.name.as_str()))
///     .collect();
/// assert_eq!(names, vec![Some("Luke Skywalker"), None, Some("R2-D2")]);
/// # Ok(())
/// # }
/// ```
pub fn produce_people<'a, S, I>(
    source: &'a S,
    ids: I,
    width: NonZeroUsize,
) -> impl Stream<Item = Result<Option<Person>, FetchError>> + 'a
where
    S: ResourceSource + ?Sized,
    I: IntoIterator<Item = PersonId>,
{
    let ids: Vec<PersonId> = ids.into_iter().collect();
    let windows: Vec<Vec<PersonId>> = ids.chunks(width.get()).map(<[_]>::to_vec).collect();
    stream::try_unfold(windows.into_iter(), move |mut remaining| async move {
        let Some(window) = remaining.next() else {
            return Ok(None);
        };
        let results = fetch_window(source, &window).await?;
        let items = stream::iter(results.into_iter().map(Ok::<_, FetchError>));
        Ok::<_, FetchError>(Some((items, remaining)))
    })
    .try_flatten()
}

async fn fetch_window<S>(source: &S, window: &[PersonId]) -> Result<Vec<Option<Person>>, FetchError>
where
    S: ResourceSource + ?Sized,
{
    debug!("fetching window {window:?}");
    try_join_all(window.iter().map(|&id| fetch_person(source, id))).await
}
