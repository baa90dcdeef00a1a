//! Pure reducers turning combined snapshots into screen view states.
//!
//! # Responsibility
//! - Filter, sort and aggregate the latest snapshots for presentation.
//!
//! # Invariants
//! - Reducers are pure: the same inputs always yield the same state.
//! - Aggregates come from the task collection being reduced, never from
//!   `Board::task_count`.
//! - Every sort ends on an identifier tiebreak, so orderings are total.

pub mod board_detail;
pub mod boards;
pub mod profile;
pub mod sort;
