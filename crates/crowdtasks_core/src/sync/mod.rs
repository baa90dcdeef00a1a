//! Live snapshot plumbing between the store and the reducers.
//!
//! # Responsibility
//! - Merge independently updating snapshot streams into one combined value.
//! - Adapt raw document snapshots into typed model snapshots.
//!
//! # Invariants
//! - A combined value is only produced once every source has produced one.
//! - The first source error is forwarded and ends the combined stream.

pub mod combine;
pub mod streams;
