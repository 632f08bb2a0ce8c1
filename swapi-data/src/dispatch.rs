//! Background persistence of regrouped batches.
//!
//! Every batch with at least one present record becomes an independent task
//! on Tokio's blocking pool. The driver keeps producing while earlier batches
//! commit; an optional cap bounds how many commits may be outstanding.
#![forbid(unsafe_code)]

use std::error::Error as StdError;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use log::{debug, warn};
use swapi_core::{PersonBatch, PersonSink, present_people};
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};

/// Default cap on outstanding persistence tasks.
pub const DEFAULT_MAX_PENDING: NonZeroUsize = match NonZeroUsize::new(8) {
    Some(value) => value,
    None => NonZeroUsize::MIN,
};

/// Errors surfaced by the [`Dispatcher`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The sink rejected a batch; its transaction was rolled back.
    #[error("failed to persist batch: {source}")]
    Sink {
        /// Error reported by the sink.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// A persistence task panicked or was cancelled.
    #[error("persistence task did not complete: {0}")]
    Join(#[from] JoinError),
}

/// Totals reported once every dispatched batch has settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Batches handed to the dispatcher, including ones with no present record.
    pub batches: usize,
    /// Rows committed by successful tasks.
    pub rows: usize,
}

/// Launches one persistence task per batch and collects their outcomes.
///
/// Tasks never cancel each other: a failing batch rolls back only its own
/// transaction. [`Dispatcher::finish`] waits for every task still running.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use swapi_core::test_support::{MemorySink, sample_person};
/// use swapi_data::dispatch::Dispatcher;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = Arc::new(MemorySink::default());
/// let runtime = tokio::runtime::Builder::new_current_thread().build()?;
/// let summary = runtime.block_on(async {
///     let mut dispatcher = Dispatcher::new(Arc::clone(&sink));
///     dispatcher.dispatch(vec![Some(sample_person(1)), None]).await;
///     dispatcher.dispatch(vec![None]).await;
///     dispatcher.finish().await
/// })?;
/// assert_eq!(summary.batches, 2);
/// assert_eq!(summary.rows, 1);
/// assert_eq!(sink.stored_ids(), vec![1]);
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<K: PersonSink> {
    sink: Arc<K>,
    tasks: JoinSet<Result<usize, K::Error>>,
    max_pending: Option<NonZeroUsize>,
    summary: DispatchSummary,
    first_error: Option<DispatchError>,
}

impl<K: PersonSink> Dispatcher<K> {
    /// Create a dispatcher writing to `sink` with the default cap.
    pub fn new(sink: Arc<K>) -> Self {
        Self {
            sink,
            tasks: JoinSet::new(),
            max_pending: Some(DEFAULT_MAX_PENDING),
            summary: DispatchSummary::default(),
            first_error: None,
        }
    }

    /// Limit outstanding tasks to `max_pending`; `None` removes the limit.
    #[must_use]
    pub fn with_max_pending(mut self, max_pending: Option<NonZeroUsize>) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// Number of tasks that have not been reaped yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Hand a regrouped batch to a background persistence task.
    ///
    /// Absent markers are dropped first; a batch left empty is counted but
    /// spawns nothing. When the cap is reached the call waits for a running
    /// task to finish before spawning. The batch in hand is always spawned;
    /// a failure reaped while waiting is kept for [`Dispatcher::finish`].
    pub async fn dispatch(&mut self, batch: PersonBatch) {
        self.summary.batches += 1;
        let people = present_people(batch);
        if people.is_empty() {
            debug!("batch {} has no present records", self.summary.batches);
            return;
        }

        if let Some(cap) = self.max_pending {
            while self.tasks.len() >= cap.get() {
                self.reap_one().await;
            }
        }

        let sink = Arc::clone(&self.sink);
        debug!(
            "dispatching batch {} with {} records",
            self.summary.batches,
            people.len()
        );
        self.tasks
            .spawn_blocking(move || sink.insert_people(&people));
    }

    /// Wait for every outstanding task and report the totals.
    ///
    /// # Errors
    ///
    /// Returns the first failure observed, including one reaped during
    /// [`Dispatcher::dispatch`], after all tasks have settled.
    pub async fn finish(mut self) -> Result<DispatchSummary, DispatchError> {
        while !self.tasks.is_empty() {
            self.reap_one().await;
        }
        match self.first_error.take() {
            Some(err) => Err(err),
            None => Ok(self.summary),
        }
    }

    /// Settle one finished task, keeping only the first failure.
    async fn reap_one(&mut self) {
        let Some(joined) = self.tasks.join_next().await else {
            return;
        };
        let failure = match joined {
            Ok(Ok(rows)) => {
                self.summary.rows += rows;
                return;
            }
            Ok(Err(source)) => {
                warn!("persisting batch failed: {source}");
                DispatchError::Sink {
                    source: Box::new(source),
                }
            }
            Err(err) => {
                warn!("persistence task failed: {err}");
                DispatchError::Join(err)
            }
        };
        self.first_error.get_or_insert(failure);
    }
}

impl<K: PersonSink> fmt::Debug for Dispatcher<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.tasks.len())
            .field("max_pending", &self.max_pending)
            .field("summary", &self.summary)
            .field("failed", &self.first_error.is_some())
            .finish_non_exhaustive()
    }
}
