//! Domain model for shared boards, their tasks and member profiles.
//!
//! # Responsibility
//! - Define the document shapes exchanged with the remote store.
//! - Keep field names stable: they are the wire contract with stored data.
//!
//! # Invariants
//! - Serialized field names are camelCase and must not be renamed without a
//!   data migration.
//! - `Board::task_count` is a denormalized hint; live counts are always
//!   derived from the task collection a view actually holds.

pub mod board;
pub mod member;
pub mod task;
pub mod validation;

/// Identifier of a board document, assigned by the store on creation.
pub type BoardId = String;
/// Identifier of a task document, unique within its board.
pub type TaskId = String;
/// Identifier of an authenticated user.
pub type UserId = String;
