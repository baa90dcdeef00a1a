//! Document, path, query and patch types shared by every store.
//!
//! # Invariants
//! - A document path is always `collection/id`; collections may be nested
//!   under a parent document (`boards/{boardId}/tasks`).
//! - Query results are ordered by document id so snapshots are stable.

use crate::store::source::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Store-assigned document identifier.
pub type DocumentId = String;
/// Top-level fields of one stored document.
pub type Fields = serde_json::Map<String, Value>;

const BOARDS: &str = "boards";
const TASKS: &str = "tasks";
const USERS: &str = "users";

/// Slash-separated collection path, e.g. `boards` or `boards/b1/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the document `id` inside this collection.
    pub fn doc(&self, id: impl Into<DocumentId>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full path of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: DocumentId,
}

impl DocumentPath {
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Nested collection under this document.
    pub fn child(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{self}/{name}"))
    }

    /// Id of the document owning this document's collection, if nested.
    pub fn parent_id(&self) -> Option<&str> {
        let (parent, _) = self.collection.0.rsplit_once('/')?;
        parent.rsplit('/').next()
    }

    /// Returns whether this path sits at or below `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.to_string().starts_with(prefix)
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

pub fn boards() -> CollectionPath {
    CollectionPath::new(BOARDS)
}

pub fn board(board_id: &str) -> DocumentPath {
    boards().doc(board_id)
}

pub fn tasks(board_id: &str) -> CollectionPath {
    board(board_id).child(TASKS)
}

pub fn task(board_id: &str, task_id: &str) -> DocumentPath {
    tasks(board_id).doc(task_id)
}

pub fn users() -> CollectionPath {
    CollectionPath::new(USERS)
}

pub fn user(user_id: &str) -> DocumentPath {
    users().doc(user_id)
}

/// Snapshot of one stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: DocumentPath, fields: Fields) -> Self {
        Self { path, fields }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Decodes the document fields into a typed model.
    ///
    /// # Errors
    /// - Returns `StoreError::InvalidData` when the stored shape does not fit.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|err| {
            StoreError::InvalidData(format!("cannot decode `{}`: {err}", self.path))
        })
    }
}

/// Encodes a model into top-level document fields.
///
/// # Errors
/// - Returns `StoreError::InvalidData` when the model does not serialize to
///   a JSON object.
pub fn encode_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(StoreError::InvalidData(format!(
            "document must encode to an object, got {other}"
        ))),
        Err(err) => Err(StoreError::InvalidData(err.to_string())),
    }
}

/// Single-field predicate for collection queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    /// Array field contains `value`.
    ArrayContains { field: String, value: Value },
    /// Field equals one of `values`.
    In { field: String, values: Vec<Value> },
}

/// Live or one-shot query over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub collection: CollectionPath,
    pub filter: Option<QueryFilter>,
}

impl CollectionQuery {
    pub fn all(collection: CollectionPath) -> Self {
        Self {
            collection,
            filter: None,
        }
    }

    pub fn array_contains(
        collection: CollectionPath,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            collection,
            filter: Some(QueryFilter::ArrayContains {
                field: field.into(),
                value: value.into(),
            }),
        }
    }

    pub fn field_in(collection: CollectionPath, field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            collection,
            filter: Some(QueryFilter::In {
                field: field.into(),
                values,
            }),
        }
    }

    /// Returns whether a document at `path` with `fields` is in the result.
    pub fn matches(&self, path: &DocumentPath, fields: &Fields) -> bool {
        if path.collection() != &self.collection {
            return false;
        }
        match &self.filter {
            None => true,
            Some(QueryFilter::ArrayContains { field, value }) => fields
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            Some(QueryFilter::In { field, values }) => {
                let fallback_id;
                let candidate = match fields.get(field) {
                    Some(value) => value,
                    // Legacy documents may omit the `id` field.
                    None if field == "id" => {
                        fallback_id = Value::String(path.id().to_string());
                        &fallback_id
                    }
                    None => return false,
                };
                values.contains(candidate)
            }
        }
    }
}

/// One field mutation inside an update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Set(Value),
    /// Appends values not already present. Idempotent.
    ArrayUnion(Vec<Value>),
    /// Removes every occurrence of the values. Idempotent.
    ArrayRemove(Vec<Value>),
}

/// Partial update applied atomically to one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    ops: BTreeMap<String, FieldOp>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.insert(field.into(), FieldOp::Set(value.into()));
        self
    }

    pub fn array_union(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.ops.insert(field.into(), FieldOp::ArrayUnion(values));
        self
    }

    pub fn array_remove(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.ops.insert(field.into(), FieldOp::ArrayRemove(values));
        self
    }

    /// Applies every operation to `fields` in field-name order.
    pub fn apply_to(&self, fields: &mut Fields) {
        for (name, op) in &self.ops {
            match op {
                FieldOp::Set(value) => {
                    fields.insert(name.clone(), value.clone());
                }
                FieldOp::ArrayUnion(values) => {
                    let slot = fields
                        .entry(name.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if !slot.is_array() {
                        *slot = Value::Array(Vec::new());
                    }
                    if let Value::Array(items) = slot {
                        for value in values {
                            if !items.contains(value) {
                                items.push(value.clone());
                            }
                        }
                    }
                }
                FieldOp::ArrayRemove(values) => {
                    if let Some(Value::Array(items)) = fields.get_mut(name) {
                        items.retain(|item| !values.contains(item));
                    }
                }
            }
        }
    }
}

/// Result of a delete, reported atomically by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The document existed and is now gone.
    Deleted,
    /// Nothing was stored at the path.
    Missing,
}
