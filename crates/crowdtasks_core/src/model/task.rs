//! Task domain model.
//!
//! # Responsibility
//! - Define the `boards/{boardId}/tasks/{taskId}` document shape.
//!
//! # Invariants
//! - `price` is finite and non-negative.
//! - `id`, `board_id` and `created_by` never change after creation.
//! - `created_at` comes from the store clock; devices may skew, so ordering
//!   on it always falls back to `id`.

use crate::model::validation::{normalize_required, ValidationError};
use crate::model::{BoardId, TaskId, UserId};
use crate::store::document::{encode_fields, Document, Fields};
use crate::store::source::StoreResult;
use serde::{Deserialize, Serialize};

pub const IS_DONE_FIELD: &str = "isDone";
pub const PRICE_FIELD: &str = "price";
pub const NOTES_FIELD: &str = "notes";
pub const DUE_DATE_FIELD: &str = "dueDate";
pub const PRIORITY_FIELD: &str = "priority";
pub const ASSIGNED_TO_FIELD: &str = "assignedTo";

/// Task priority shown in task details.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Priority {
    /// Stored representation, identical to the serde encoding.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::None => "NONE",
        }
    }
}

/// One entry of a board's task list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub id: TaskId,
    pub board_id: BoardId,
    pub title: String,
    pub is_done: bool,
    pub created_by: UserId,
    /// Meaningful for grocery boards; always summed into the total cost.
    pub price: f64,
    /// Store clock, epoch milliseconds.
    pub created_at: i64,
    pub notes: String,
    /// Epoch milliseconds.
    pub due_date: Option<i64>,
    pub priority: Priority,
    /// May reference a user who already left the board.
    pub assigned_to: Option<UserId>,
}

impl Task {
    /// Builds a new, not-done task.
    pub fn new(
        id: impl Into<TaskId>,
        board_id: impl Into<BoardId>,
        title: &str,
        created_by: impl Into<UserId>,
        created_at: i64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: id.into(),
            board_id: board_id.into(),
            title: normalize_required("task title", title)?,
            created_by: created_by.into(),
            created_at,
            ..Self::default()
        })
    }

    /// Decodes a task document, filling blank ids from the document path.
    pub fn from_document(doc: &Document) -> StoreResult<Self> {
        let mut task: Task = doc.decode()?;
        if task.id.trim().is_empty() {
            task.id = doc.id().to_string();
        }
        if task.board_id.trim().is_empty() {
            if let Some(board_id) = doc.path.parent_id() {
                task.board_id = board_id.to_string();
            }
        }
        Ok(task)
    }

    pub fn to_fields(&self) -> StoreResult<Fields> {
        encode_fields(self)
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_to.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Task};

    #[test]
    fn new_task_starts_not_done_and_unassigned() {
        let task = Task::new("t1", "b1", " Milk ", "u1", 42).expect("valid task");
        assert_eq!(task.title, "Milk");
        assert!(!task.is_done);
        assert!(!task.is_assigned());
        assert_eq!(task.priority, Priority::None);
        assert_eq!(task.price, 0.0);
        assert_eq!(task.created_at, 42);
    }

    #[test]
    fn serialization_uses_wire_field_names() {
        let mut task = Task::new("t1", "b1", "Milk", "u1", 7).unwrap();
        task.priority = Priority::High;
        task.due_date = Some(1_700_000_000_000);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["isDone"], false);
        assert_eq!(json["boardId"], "b1");
        assert_eq!(json["createdBy"], "u1");
        assert_eq!(json["createdAt"], 7);
        assert_eq!(json["priority"], "HIGH");
        assert_eq!(json["dueDate"], 1_700_000_000_000_i64);
        assert!(json["assignedTo"].is_null());
    }

    #[test]
    fn priority_wire_names_match_serde() {
        for priority in [Priority::High, Priority::Medium, Priority::Low, Priority::None] {
            assert_eq!(serde_json::to_value(priority).unwrap(), priority.as_wire());
        }
    }

    #[test]
    fn missing_fields_decode_to_defaults() {
        let task: Task = serde_json::from_value(serde_json::json!({ "title": "Eggs" })).unwrap();
        assert_eq!(task.title, "Eggs");
        assert!(!task.is_done);
        assert_eq!(task.priority, Priority::None);
        assert_eq!(task.assigned_to, None);
    }
}
