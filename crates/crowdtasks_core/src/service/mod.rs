//! Intent operations: remote writes plus their counter deltas.
//!
//! # Responsibility
//! - Turn user intents into store writes.
//! - Keep the denormalized board task count in step with task creation and
//!   deletion through atomic deltas only.
//!
//! # Invariants
//! - The task count is never read-modify-written by the client.
//! - A `-1` delta is issued only for a task the store confirms it deleted.
//! - Failures are returned to the caller, never retried.

pub mod board_service;
pub mod session;
pub mod user_service;
