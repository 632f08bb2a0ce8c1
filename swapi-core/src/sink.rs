//! Persistence seam for enriched person records.
//!
//! The [`PersonSink`] trait is the only thing the dispatcher knows about the
//! relational store. Each call is one unit of work: implementers open their
//! own session, insert every record in a single transaction, and commit.

use crate::Person;

/// Transactional destination for batches of [`Person`] records.
///
/// Implementations are shared across concurrently running dispatch tasks,
/// so they must not hold a session open between calls.
///
/// # Examples
///
/// ```rust
/// use std::sync::Mutex;
/// use swapi_core::{Person, PersonSink};
///
/// #[derive(Default)]
/// struct CountingSink {
///     rows: Mutex<usize>,
/// }
///
/// impl PersonSink for CountingSink {
///     type Error = std::io::Error;
///
///     fn insert_people(&self, people: &[Person]) -> Result<usize, Self::Error> {
///         let mut rows = self
///             .rows
///             .lock()
///             .map_err(|_| std::io::Error::other("poisoned"))?;
///         *rows += people.len();
///         Ok(people.len())
///     }
/// }
///
/// let sink = CountingSink::default();
/// assert_eq!(sink.insert_people(&[]).expect("empty insert"), 0);
/// ```
pub trait PersonSink: Send + Sync + 'static {
    /// Failure raised when a batch cannot be committed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert `people` as new rows inside one transaction.
    ///
    /// Returns the number of rows written. A failure must leave none of the
    /// batch committed.
    fn insert_people(&self, people: &[Person]) -> Result<usize, Self::Error>;
}
