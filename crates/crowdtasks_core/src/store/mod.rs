//! Remote collection source contract and the in-memory implementation.
//!
//! # Responsibility
//! - Define the document-store capabilities the engine consumes: live
//!   snapshots, one-shot reads, field writes and atomic numeric deltas.
//! - Provide an in-process store that honours the same contract for tests
//!   and local demos.
//!
//! # Invariants
//! - Live subscriptions emit the current value first, then one snapshot per
//!   relevant change.
//! - Numeric deltas are atomic with respect to each other.
//! - Dropping a snapshot stream releases its listener.

pub mod document;
pub mod memory;
pub mod source;
