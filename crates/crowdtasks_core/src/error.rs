//! Error taxonomy surfaced by intent operations.
//!
//! # Invariants
//! - No variant is retried automatically; callers decide.
//! - `PartialDelete` and `CounterDeltaFailed` report writes that already
//!   happened, so callers must not treat them as "nothing changed".

use crate::model::validation::ValidationError;
use crate::model::{BoardId, TaskId, UserId};
use crate::store::source::StoreError;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Operation needs a signed-in actor.
    #[error("operation requires a signed-in user")]
    Unauthenticated,
    /// Target entity does not exist (or was deleted).
    #[error("not found: {0}")]
    NotFound(String),
    /// Actor is not a member of the board.
    #[error("user {user_id} is not a member of board {board_id}")]
    NotMember { user_id: UserId, board_id: BoardId },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Store or network unavailable.
    #[error("store unavailable: {0}")]
    TransientIo(String),
    #[error("invalid stored data: {0}")]
    InvalidData(String),
    /// The task write succeeded but the board counter was not adjusted.
    #[error("task {task_id} on board {board_id} was written but its count delta failed: {source}")]
    CounterDeltaFailed {
        board_id: BoardId,
        task_id: TaskId,
        #[source]
        source: StoreError,
    },
    /// Cascade delete stopped part-way; the board is still reachable.
    #[error(
        "board {board_id} partially deleted: {deleted_tasks} task(s) removed, {remaining_tasks} remaining, board kept: {source}"
    )]
    PartialDelete {
        board_id: BoardId,
        deleted_tasks: usize,
        remaining_tasks: usize,
        #[source]
        source: StoreError,
    },
}

impl CoreError {
    /// Returns whether the failure came from store availability.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TransientIo(_) => true,
            Self::CounterDeltaFailed { source, .. } | Self::PartialDelete { source, .. } => {
                source.is_transient()
            }
            _ => false,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(path) => Self::NotFound(path),
            StoreError::Unavailable(reason) => Self::TransientIo(reason),
            StoreError::InvalidData(reason) => Self::InvalidData(reason),
        }
    }
}
