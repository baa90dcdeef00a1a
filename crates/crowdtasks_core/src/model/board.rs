//! Board domain model.
//!
//! # Responsibility
//! - Define the `boards/{boardId}` document shape.
//! - Provide membership helpers used by the mutation coordinator.
//!
//! # Invariants
//! - The owner is always part of `member_ids`.
//! - `kind` is fixed at creation time.
//! - `task_count` is only ever changed through atomic store deltas.

use crate::model::validation::{normalize_required, ValidationError};
use crate::model::{BoardId, UserId};
use crate::store::document::{encode_fields, Document, Fields};
use crate::store::source::StoreResult;
use serde::{Deserialize, Serialize};

/// Wire field holding the denormalized task count.
pub const TASK_COUNT_FIELD: &str = "taskCount";
/// Wire field holding the member id array.
pub const MEMBER_IDS_FIELD: &str = "memberIds";

/// Board flavour. Grocery boards show per-task prices and a total cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardType {
    #[default]
    Default,
    Grocery,
}

/// Shared task board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
    pub member_ids: Vec<UserId>,
    /// Serialized as `type` to match the stored document.
    #[serde(rename = "type")]
    pub kind: BoardType,
    /// Denormalized hint. May drift from the live task collection.
    pub task_count: i64,
}

impl Board {
    /// Builds a freshly created board owned by `owner_id`.
    ///
    /// # Invariants
    /// - The owner is the sole initial member.
    /// - `task_count` starts at zero.
    pub fn new_owned(
        id: impl Into<BoardId>,
        name: &str,
        description: &str,
        kind: BoardType,
        owner_id: impl Into<UserId>,
    ) -> Result<Self, ValidationError> {
        let owner_id = owner_id.into();
        Ok(Self {
            id: id.into(),
            name: normalize_required("board name", name)?,
            description: description.trim().to_string(),
            member_ids: vec![owner_id.clone()],
            owner_id,
            kind,
            task_count: 0,
        })
    }

    /// Decodes a board document, filling a blank `id` from the document path.
    pub fn from_document(doc: &Document) -> StoreResult<Self> {
        let mut board: Board = doc.decode()?;
        if board.id.trim().is_empty() {
            board.id = doc.id().to_string();
        }
        Ok(board)
    }

    /// Encodes this board into stored document fields.
    pub fn to_fields(&self) -> StoreResult<Fields> {
        encode_fields(self)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|member| member == user_id)
    }
}
