//! Board and task intent operations.
//!
//! # Responsibility
//! - Create, update, join and delete boards.
//! - Add, edit and delete tasks, pairing creation and deletion with the
//!   matching task-count delta.
//!
//! # Invariants
//! - `add_task` writes the task before issuing `+1`.
//! - `delete_task` issues `-1` only when the store reports `Deleted`, so
//!   repeated or racing deletes never double-decrement.
//! - `delete_board` removes child tasks before the board and reports a
//!   partial cascade distinctly from a total failure.

use crate::error::{CoreError, CoreResult};
use crate::model::board::{Board, BoardType, MEMBER_IDS_FIELD, TASK_COUNT_FIELD};
use crate::model::task::{
    Priority, Task, ASSIGNED_TO_FIELD, DUE_DATE_FIELD, IS_DONE_FIELD, NOTES_FIELD, PRICE_FIELD,
    PRIORITY_FIELD,
};
use crate::model::validation::{normalize_required, validate_price};
use crate::model::{BoardId, UserId};
use crate::service::session::Session;
use crate::store::document::{self, CollectionQuery, DeleteOutcome, DocumentPath, FieldPatch};
use crate::store::source::{DocumentStore, StoreError};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Editable detail fields of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDetails {
    pub notes: String,
    /// Epoch milliseconds.
    pub due_date: Option<i64>,
    pub priority: Priority,
}

/// Mutation coordinator for boards and their tasks.
pub struct BoardService<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    session: Arc<dyn Session>,
}

impl<S: DocumentStore + ?Sized> Clone for BoardService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: DocumentStore + ?Sized> BoardService<S> {
    pub fn new(store: Arc<S>, session: Arc<dyn Session>) -> Self {
        Self { store, session }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.session.current_user_id()
    }

    fn require_actor(&self) -> CoreResult<UserId> {
        self.session
            .current_user_id()
            .ok_or(CoreError::Unauthenticated)
    }

    /// Loads one board.
    ///
    /// # Errors
    /// - `NotFound` when the board does not exist.
    pub async fn board(&self, board_id: &str) -> CoreResult<Board> {
        let path = document::board(board_id);
        match self.store.get(&path).await? {
            Some(doc) => Ok(Board::from_document(&doc)?),
            None => Err(CoreError::NotFound(path.to_string())),
        }
    }

    /// Creates a board owned by the signed-in user.
    pub async fn create_board(
        &self,
        name: &str,
        description: &str,
        kind: BoardType,
    ) -> CoreResult<Board> {
        let actor = self.require_actor()?;
        let path = self.store.allocate_path(&document::boards());
        let board = Board::new_owned(path.id(), name, description, kind, actor)?;
        self.store.set(&path, board.to_fields()?).await?;
        info!(
            "event=board_create module=service status=ok board_id={} type={:?}",
            board.id, board.kind
        );
        Ok(board)
    }

    /// Renames a board and replaces its description.
    pub async fn update_board(&self, board_id: &str, name: &str, description: &str) -> CoreResult<()> {
        self.require_actor()?;
        let name = normalize_required("board name", name)?;
        let patch = FieldPatch::new()
            .set("name", name)
            .set("description", description.trim());
        self.store.update(&document::board(board_id), patch).await?;
        debug!(
            "event=board_update module=service status=ok board_id={}",
            board_id
        );
        Ok(())
    }

    /// Adds the signed-in user to the board's members.
    ///
    /// Joining a board twice leaves the member set unchanged.
    pub async fn join_board(&self, board_id: &str) -> CoreResult<()> {
        let actor = self.require_actor()?;
        let patch =
            FieldPatch::new().array_union(MEMBER_IDS_FIELD, vec![Value::String(actor.clone())]);
        self.store.update(&document::board(board_id), patch).await?;
        info!(
            "event=board_join module=service status=ok board_id={} user_id={}",
            board_id, actor
        );
        Ok(())
    }

    /// Deletes every task of the board, then the board itself.
    ///
    /// Returns the number of task documents removed.
    ///
    /// # Errors
    /// - `NotMember` when the signed-in user is not a board member.
    /// - `PartialDelete` when some tasks were removed before a failure; the
    ///   board stays reachable and its task count no longer matches.
    /// - The plain store error when nothing was removed.
    pub async fn delete_board(&self, board_id: &str) -> CoreResult<usize> {
        let actor = self.require_actor()?;
        let board = self.board(board_id).await?;
        if !board.is_member(&actor) {
            return Err(CoreError::NotMember {
                user_id: actor,
                board_id: board_id.to_string(),
            });
        }

        let task_docs = self
            .store
            .get_collection(&CollectionQuery::all(document::tasks(board_id)))
            .await?;
        let total = task_docs.len();
        let mut deleted = 0;
        for doc in &task_docs {
            if let Err(source) = self.store.delete(&doc.path).await {
                return Err(cascade_error(board_id, deleted, total - deleted, source));
            }
            deleted += 1;
        }

        if let Err(source) = self.store.delete(&document::board(board_id)).await {
            return Err(cascade_error(board_id, deleted, 0, source));
        }

        info!(
            "event=board_delete module=service status=ok board_id={} tasks_deleted={}",
            board_id, deleted
        );
        Ok(deleted)
    }

    /// Creates a task and increments the board's task count.
    ///
    /// # Errors
    /// - `NotFound` when the board does not exist.
    /// - `CounterDeltaFailed` when the task was stored but the `+1` failed.
    pub async fn add_task(&self, board_id: &str, title: &str) -> CoreResult<Task> {
        let actor = self.require_actor()?;
        let path = self.store.allocate_path(&document::tasks(board_id));
        let task = Task::new(
            path.id(),
            board_id,
            title,
            actor,
            self.store.server_time_ms(),
        )?;

        let board_path = document::board(board_id);
        if self.store.get(&board_path).await?.is_none() {
            return Err(CoreError::NotFound(board_path.to_string()));
        }

        self.store.set(&path, task.to_fields()?).await?;
        self.apply_count_delta(&board_path, board_id, &task.id, 1)
            .await?;
        debug!(
            "event=task_add module=service status=ok board_id={} task_id={}",
            board_id, task.id
        );
        Ok(task)
    }

    /// Deletes a task and decrements the board's task count.
    ///
    /// Deleting a task that is already gone is a no-op returning
    /// `DeleteOutcome::Missing` and issues no delta.
    ///
    /// # Errors
    /// - `NotFound` when the board itself no longer exists.
    /// - `CounterDeltaFailed` when the task was removed but the `-1` failed.
    pub async fn delete_task(&self, board_id: &str, task_id: &str) -> CoreResult<DeleteOutcome> {
        self.require_actor()?;
        let board_path = document::board(board_id);
        match self.store.delete(&document::task(board_id, task_id)).await? {
            DeleteOutcome::Deleted => {
                self.apply_count_delta(&board_path, board_id, task_id, -1)
                    .await?;
                debug!(
                    "event=task_delete module=service status=ok board_id={} task_id={}",
                    board_id, task_id
                );
                Ok(DeleteOutcome::Deleted)
            }
            DeleteOutcome::Missing => {
                if self.store.get(&board_path).await?.is_none() {
                    return Err(CoreError::NotFound(board_path.to_string()));
                }
                debug!(
                    "event=task_delete module=service status=noop board_id={} task_id={}",
                    board_id, task_id
                );
                Ok(DeleteOutcome::Missing)
            }
        }
    }

    pub async fn toggle_task(&self, board_id: &str, task_id: &str, is_done: bool) -> CoreResult<()> {
        self.update_task(board_id, task_id, FieldPatch::new().set(IS_DONE_FIELD, is_done))
            .await
    }

    pub async fn update_task_price(&self, board_id: &str, task_id: &str, price: f64) -> CoreResult<()> {
        let price = validate_price(price)?;
        self.update_task(board_id, task_id, FieldPatch::new().set(PRICE_FIELD, price))
            .await
    }

    pub async fn update_task_details(
        &self,
        board_id: &str,
        task_id: &str,
        details: &TaskDetails,
    ) -> CoreResult<()> {
        let patch = FieldPatch::new()
            .set(NOTES_FIELD, details.notes.as_str())
            .set(DUE_DATE_FIELD, details.due_date)
            .set(PRIORITY_FIELD, details.priority.as_wire());
        self.update_task(board_id, task_id, patch).await
    }

    /// Assigns the task. Membership of `user_id` is not checked here.
    pub async fn assign_task(&self, board_id: &str, task_id: &str, user_id: &str) -> CoreResult<()> {
        let patch = FieldPatch::new().set(ASSIGNED_TO_FIELD, user_id);
        self.update_task(board_id, task_id, patch).await
    }

    pub async fn unassign_task(&self, board_id: &str, task_id: &str) -> CoreResult<()> {
        let patch = FieldPatch::new().set(ASSIGNED_TO_FIELD, Value::Null);
        self.update_task(board_id, task_id, patch).await
    }

    async fn update_task(&self, board_id: &str, task_id: &str, patch: FieldPatch) -> CoreResult<()> {
        self.require_actor()?;
        self.store
            .update(&document::task(board_id, task_id), patch)
            .await?;
        Ok(())
    }

    async fn apply_count_delta(
        &self,
        board_path: &DocumentPath,
        board_id: &str,
        task_id: &str,
        delta: i64,
    ) -> CoreResult<()> {
        self.store
            .apply_numeric_delta(board_path, TASK_COUNT_FIELD, delta)
            .await
            .map_err(|source| {
                warn!(
                    "event=task_count_delta module=service status=error board_id={} task_id={} delta={} error={}",
                    board_id, task_id, delta, source
                );
                CoreError::CounterDeltaFailed {
                    board_id: board_id.to_string(),
                    task_id: task_id.to_string(),
                    source,
                }
            })
    }
}

fn cascade_error(
    board_id: &str,
    deleted_tasks: usize,
    remaining_tasks: usize,
    source: StoreError,
) -> CoreError {
    warn!(
        "event=board_delete module=service status=error board_id={} tasks_deleted={} tasks_remaining={} error={}",
        board_id, deleted_tasks, remaining_tasks, source
    );
    if deleted_tasks == 0 {
        return source.into();
    }
    CoreError::PartialDelete {
        board_id: BoardId::from(board_id),
        deleted_tasks,
        remaining_tasks,
        source,
    }
}
