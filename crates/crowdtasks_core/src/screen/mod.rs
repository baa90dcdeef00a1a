//! Screens: live view-state streams plus intent entry points.
//!
//! # Responsibility
//! - Combine remote snapshot streams with client-local parameters.
//! - Reduce each combined emission into an immutable view state.
//! - Route user intents to the services.
//!
//! # Invariants
//! - Every `states()` stream starts with a loading state.
//! - A stream error yields one failed state carrying the last good data,
//!   then the stream ends; calling `states()` again resubscribes.
//! - Dropping a `states()` stream releases its store subscriptions.

pub mod board_detail;
pub mod boards;
pub mod profile;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};

/// Prefixes `updates` with the loading state.
fn starting_with<T>(loading: T, updates: impl Stream<Item = T> + Send + 'static) -> BoxStream<'static, T>
where
    T: Send + 'static,
{
    stream::once(future::ready(loading)).chain(updates).boxed()
}

/// Loading state followed by one terminal failed state.
fn failed_immediately<T>(loading: T, failed: T) -> BoxStream<'static, T>
where
    T: Send + 'static,
{
    stream::iter([loading, failed]).boxed()
}
