//! Regrouping of a stream into fixed-size batches.
//!
//! [`Rechunk`] is deliberately ignorant of how the upstream produced its
//! items: a producer may fetch in windows of two while persistence batches
//! hold ten records. The adapter pulls one item at a time, buffers up to the
//! requested size, and flushes a short final batch when the upstream ends.

use std::fmt;
use std::mem;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{FusedStream, Stream, StreamExt};

/// Stream adapter yielding `Vec`s of at most `size` upstream items.
///
/// Created by [`rechunk`].
#[must_use = "streams do nothing unless polled"]
pub struct Rechunk<S: Stream> {
    upstream: S,
    buffer: Vec<S::Item>,
    size: NonZeroUsize,
    finished: bool,
}

/// Regroup `upstream` into batches of `size` items.
///
/// Every batch except possibly the last holds exactly `size` items; an empty
/// upstream yields no batches at all. Items are never reordered or dropped.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use futures_util::{StreamExt, stream};
/// use swapi_core::rechunk;
///
/// let size = NonZeroUsize::new(2).expect("non-zero size");
/// let batches: Vec<Vec<u32>> = tokio::runtime::Builder::new_current_thread()
///     .build()
///     .expect("create Tokio runtime")
///     .block_on(rechunk(stream::iter([1, 2, 3]), size).collect());
/// assert_eq!(batches, vec![vec![1, 2], vec![3]]);
/// ```
pub fn rechunk<S>(upstream: S, size: NonZeroUsize) -> Rechunk<S>
where
    S: Stream + Unpin,
{
    Rechunk {
        upstream,
        buffer: Vec::with_capacity(size.get()),
        size,
        finished: false,
    }
}

impl<S: Stream> Rechunk<S> {
    /// Batch size this adapter flushes at.
    #[must_use]
    pub const fn size(&self) -> NonZeroUsize {
        self.size
    }

    /// Number of items currently held back waiting for a full batch.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn take_buffer(&mut self) -> Vec<S::Item> {
        mem::replace(&mut self.buffer, Vec::with_capacity(self.size.get()))
    }
}

// The buffer is never pinned; only `upstream` is polled, and it is `Unpin`.
impl<S> Unpin for Rechunk<S> where S: Stream + Unpin {}

impl<S> Stream for Rechunk<S>
where
    S: Stream + Unpin,
{
    type Item = Vec<S::Item>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        loop {
            match this.upstream.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(item)) => {
                    this.buffer.push(item);
                    if this.buffer.len() >= this.size.get() {
                        return Poll::Ready(Some(this.take_buffer()));
                    }
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    if this.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(mem::take(&mut this.buffer)));
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let size = self.size.get();
        let (lower, upper) = self.upstream.size_hint();
        let pending = self.buffer.len();
        let lower_batches = lower.saturating_add(pending).div_ceil(size);
        let upper_batches = upper
            .and_then(|value| value.checked_add(pending))
            .map(|total| total.div_ceil(size));
        (lower_batches, upper_batches)
    }
}

impl<S> FusedStream for Rechunk<S>
where
    S: Stream + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl<S: Stream> fmt::Debug for Rechunk<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rechunk")
            .field("size", &self.size)
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
