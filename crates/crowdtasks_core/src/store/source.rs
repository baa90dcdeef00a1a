//! Store trait and error taxonomy.

use crate::store::document::{
    CollectionPath, CollectionQuery, DeleteOutcome, Document, DocumentPath, FieldPatch, Fields,
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Live stream of snapshots for one query or document.
pub type SnapshotStream<T> = BoxStream<'static, StoreResult<T>>;

/// Failure reported by a document store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Target document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),
    /// Store or network temporarily unavailable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Stored data does not have the expected shape.
    #[error("invalid document data: {0}")]
    InvalidData(String),
}

impl StoreError {
    pub fn not_found(path: &DocumentPath) -> Self {
        Self::NotFound(path.to_string())
    }

    /// Returns whether a later attempt may succeed without changes.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Firestore-like document store consumed by the engine.
///
/// Implementations must deliver snapshots in arrival order per subscription
/// and apply `apply_numeric_delta` atomically.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribes to every document matching `query`.
    fn subscribe_collection(&self, query: CollectionQuery) -> SnapshotStream<Vec<Document>>;

    /// Subscribes to one document; `None` means the document does not exist.
    fn subscribe_document(&self, path: DocumentPath) -> SnapshotStream<Option<Document>>;

    /// Reserves a fresh document path inside `collection`.
    fn allocate_path(&self, collection: &CollectionPath) -> DocumentPath;

    /// Store clock in epoch milliseconds.
    fn server_time_ms(&self) -> i64;

    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>>;

    async fn get_collection(&self, query: &CollectionQuery) -> StoreResult<Vec<Document>>;

    /// Creates or replaces a document.
    async fn set(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Writes `fields` under a freshly allocated id and returns its path.
    async fn create(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<DocumentPath> {
        let path = self.allocate_path(collection);
        self.set(&path, fields).await?;
        Ok(path)
    }

    /// Applies a partial update. Fails with `NotFound` for missing documents.
    async fn update(&self, path: &DocumentPath, patch: FieldPatch) -> StoreResult<()>;

    /// Deletes a document and reports whether it existed.
    async fn delete(&self, path: &DocumentPath) -> StoreResult<DeleteOutcome>;

    /// Atomically adds `delta` to an integer field.
    async fn apply_numeric_delta(
        &self,
        path: &DocumentPath,
        field: &str,
        delta: i64,
    ) -> StoreResult<()>;
}
