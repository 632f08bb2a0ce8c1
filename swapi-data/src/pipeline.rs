//! End-to-end load: produce, regroup, and dispatch.
#![forbid(unsafe_code)]

use std::num::NonZeroUsize;
use std::pin::pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use log::{info, warn};
use swapi_core::{IdRange, Person, PersonBatch, PersonSink, rechunk};
use thiserror::Error;

use crate::dispatch::{DEFAULT_MAX_PENDING, DispatchError, Dispatcher};
use crate::enrich::{FetchError, produce_people};
use crate::source::ResourceSource;

const DEFAULT_WIDTH: NonZeroUsize = match NonZeroUsize::new(2) {
    Some(value) => value,
    None => NonZeroUsize::MIN,
};

/// Tunables for [`run_pipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Identifiers to load.
    pub ids: IdRange,
    /// Fetch window width.
    pub concurrency: NonZeroUsize,
    /// Records per persisted batch.
    pub batch_size: NonZeroUsize,
    /// Cap on outstanding persistence tasks; `None` is unbounded.
    pub max_pending_batches: Option<NonZeroUsize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            ids: IdRange::default(),
            concurrency: DEFAULT_WIDTH,
            batch_size: DEFAULT_WIDTH,
            max_pending_batches: Some(DEFAULT_MAX_PENDING),
        }
    }
}

impl PipelineOptions {
    /// Load `ids` instead of the default range.
    #[must_use]
    pub fn with_ids(mut self, ids: IdRange) -> Self {
        self.ids = ids;
        self
    }

    /// Fetch up to `concurrency` people at once.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Persist in batches of `batch_size` records.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Bound outstanding persistence tasks; `None` removes the bound.
    #[must_use]
    pub fn with_max_pending_batches(mut self, max_pending: Option<NonZeroUsize>) -> Self {
        self.max_pending_batches = max_pending;
        self
    }
}

/// Outcome of a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Identifiers requested from the API.
    pub requested: usize,
    /// Batches produced by regrouping.
    pub batches: usize,
    /// Rows committed to the sink.
    pub persisted: usize,
}

impl LoadReport {
    /// Identifiers the API reported as absent.
    #[must_use]
    pub fn absent(&self) -> usize {
        self.requested.saturating_sub(self.persisted)
    }
}

/// Errors that abort a load.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fetching or enriching a person failed.
    #[error("failed to fetch people: {0}")]
    Fetch(#[from] FetchError),
    /// Persisting a batch failed.
    #[error("failed to persist people: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Load every person in `options.ids` from `source` into `sink`.
///
/// Records flow through [`produce_people`] in windows of
/// `options.concurrency`, are regrouped into batches of `options.batch_size`,
/// and each batch is committed by a background task. The call returns once
/// every task has settled.
///
/// On the first fetch failure no further identifiers are requested; batches
/// already dispatched still run to completion before the error is returned.
/// A batch the sink rejects never stops later batches from being dispatched;
/// its error is returned once the run has drained.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use std::sync::Arc;
/// use swapi_core::{IdRange, PersonId};
/// use swapi_core::test_support::MemorySink;
/// use swapi_data::pipeline::{PipelineOptions, run_pipeline};
/// use swapi_data::source::test_support::StubResourceSource;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = StubResourceSource::default()
///     .with_person(1, "Luke Skywalker")
///     .with_person(3, "R2-D2");
/// let sink = Arc::new(MemorySink::default());
/// let options = PipelineOptions::default()
///     .with_ids(IdRange::new(PersonId::new(1)?, PersonId::new(3)?)?);
///
/// let report = tokio::runtime::Builder::new_current_thread()
///     .build()?
///     .block_on(run_pipeline(&source, Arc::clone(&sink), &options))?;
/// assert_eq!(report.persisted, 2);
/// assert_eq!(report.absent(), 1);
/// assert_eq!(sink.stored_ids(), vec![1, 3]);
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline<S, K>(
    source: &S,
    sink: Arc<K>,
    options: &PipelineOptions,
) -> Result<LoadReport, PipelineError>
where
    S: ResourceSource + ?Sized,
    K: PersonSink,
{
    info!(
        "loading people {}..={} (window {}, batch {})",
        options.ids.first(),
        options.ids.last(),
        options.concurrency,
        options.batch_size
    );
    let people = pin!(produce_people(source, options.ids.iter(), options.concurrency));
    let mut batches = rechunk(people, options.batch_size);
    let mut dispatcher = Dispatcher::new(sink).with_max_pending(options.max_pending_batches);

    let outcome = drive(&mut batches, &mut dispatcher).await;
    let settled = dispatcher.finish().await;

    let summary = match (outcome, settled) {
        (Err(err), settled) => {
            if let Err(drain) = settled {
                warn!("discarding persistence failure after abort: {drain}");
            }
            return Err(err);
        }
        (Ok(()), settled) => settled?,
    };

    let report = LoadReport {
        requested: options.ids.len(),
        batches: summary.batches,
        persisted: summary.rows,
    };
    info!(
        "loaded {} people in {} batches ({} absent)",
        report.persisted,
        report.batches,
        report.absent()
    );
    Ok(report)
}

async fn drive<B, K>(batches: &mut B, dispatcher: &mut Dispatcher<K>) -> Result<(), PipelineError>
where
    B: Stream<Item = Vec<Result<Option<Person>, FetchError>>> + Unpin,
    K: PersonSink,
{
    while let Some(results) = batches.next().await {
        let batch = results.into_iter().collect::<Result<PersonBatch, FetchError>>()?;
        dispatcher.dispatch(batch).await;
    }
    Ok(())
}
