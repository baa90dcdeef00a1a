//! Latest-value combinator over heterogeneous snapshot streams.
//!
//! Each source is mapped onto one slot of a [`SlotSet`]. Every time any
//! source yields, its slot is replaced and, once all slots hold a value, the
//! set is projected into one combined output. Projection happens inside a
//! single poll, so every output is built from one consistent set of latest
//! values.

use futures::stream::{BoxStream, SelectAll, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Fixed set of "latest value" slots fed by a [`CombineLatest`].
pub trait SlotSet: Default + Unpin + Send + 'static {
    /// Tagged value for one slot.
    type Update: Send + 'static;
    /// Combined projection of all slots.
    type Output;

    /// Replaces the slot addressed by `update`.
    fn apply(&mut self, update: Self::Update);

    /// Returns the combined value, or `None` while any slot is still empty.
    fn snapshot(&self) -> Option<Self::Output>;
}

/// Stream combining the latest value of every registered source.
///
/// # Invariants
/// - Emits nothing until every slot has been filled.
/// - After yielding an error it yields `None` forever; a new stream must be
///   built to resubscribe.
pub struct CombineLatest<S: SlotSet, E> {
    sources: SelectAll<BoxStream<'static, Result<S::Update, E>>>,
    slots: S,
    finished: bool,
}

impl<S: SlotSet, E: Send + 'static> CombineLatest<S, E> {
    pub fn new() -> Self {
        Self {
            sources: SelectAll::new(),
            slots: S::default(),
            finished: false,
        }
    }

    /// Registers one source; `into_update` tags its values with their slot.
    pub fn with_source<T, St>(mut self, source: St, into_update: fn(T) -> S::Update) -> Self
    where
        St: Stream<Item = Result<T, E>> + Send + 'static,
        T: Send + 'static,
    {
        self.sources
            .push(source.map(move |item| item.map(into_update)).boxed());
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl<S: SlotSet, E: Send + 'static> Default for CombineLatest<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SlotSet, E> CombineLatest<S, E> {
    /// Drops every remaining source so their subscriptions end with the stream.
    fn finish(&mut self) {
        self.finished = true;
        self.sources = SelectAll::new();
    }
}

impl<S: SlotSet, E> Stream for CombineLatest<S, E> {
    type Item = Result<S::Output, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            match this.sources.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(update))) => {
                    this.slots.apply(update);
                    if let Some(output) = this.slots.snapshot() {
                        return Poll::Ready(Some(Ok(output)));
                    }
                }
                Poll::Ready(Some(Err(error))) => {
                    this.finish();
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(None) => {
                    this.finish();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Turns a local parameter channel into an infallible combinator source.
///
/// Yields the current value first, then every change.
pub fn watch_source<T, E>(receiver: watch::Receiver<T>) -> impl Stream<Item = Result<T, E>>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    WatchStream::new(receiver).map(Ok)
}
