//! In-process document store with live listeners.
//!
//! # Responsibility
//! - Honour the `DocumentStore` contract without a network: snapshots,
//!   one-shot reads, field patches, atomic deltas.
//! - Expose test hooks: fault injection, subscription breaks, a delta log,
//!   a listener count and a controllable clock.
//!
//! # Invariants
//! - All state lives behind one mutex, so every write and its listener
//!   notifications are applied as one step.
//! - Listeners whose receiving stream was dropped are pruned on the next
//!   notification or count.

use crate::store::document::{
    CollectionPath, CollectionQuery, DeleteOutcome, Document, DocumentPath, FieldPatch, Fields,
};
use crate::store::source::{DocumentStore, SnapshotStream, StoreError, StoreResult};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

/// Store operation kinds that can be targeted by injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Subscribe,
    Get,
    Query,
    Set,
    Update,
    Delete,
    Delta,
}

/// One applied numeric delta, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaRecord {
    pub path: DocumentPath,
    pub field: String,
    pub delta: i64,
}

struct Fault {
    op: StoreOp,
    path_prefix: String,
    remaining: usize,
    error: StoreError,
}

struct CollectionListener {
    query: CollectionQuery,
    tx: UnboundedSender<StoreResult<Vec<Document>>>,
}

struct DocumentListener {
    path: DocumentPath,
    tx: UnboundedSender<StoreResult<Option<Document>>>,
}

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<DocumentPath, Fields>,
    collection_listeners: Vec<CollectionListener>,
    document_listeners: Vec<DocumentListener>,
    faults: Vec<Fault>,
    deltas: Vec<DeltaRecord>,
    manual_clock_ms: Option<i64>,
}

impl MemoryState {
    fn document(&self, path: &DocumentPath) -> Option<Document> {
        self.documents
            .get(path)
            .map(|fields| Document::new(path.clone(), fields.clone()))
    }

    fn take_fault(&mut self, op: StoreOp, path: &str) -> Option<StoreError> {
        let index = self
            .faults
            .iter()
            .position(|fault| fault.op == op && path.starts_with(fault.path_prefix.as_str()))?;
        let fault = &mut self.faults[index];
        fault.remaining = fault.remaining.saturating_sub(1);
        let error = fault.error.clone();
        if fault.remaining == 0 {
            self.faults.remove(index);
        }
        warn!(
            "event=fault_injected module=store status=error op={:?} path={}",
            op, path
        );
        Some(error)
    }

    fn commit(&mut self, path: &DocumentPath, after: Option<Fields>) {
        let before = match &after {
            Some(fields) => self.documents.insert(path.clone(), fields.clone()),
            None => self.documents.remove(path),
        };
        self.notify(path, before.as_ref(), after.as_ref());
    }

    fn notify(&mut self, path: &DocumentPath, before: Option<&Fields>, after: Option<&Fields>) {
        let snapshot = after.map(|fields| Document::new(path.clone(), fields.clone()));
        self.document_listeners.retain(|listener| {
            if listener.path != *path {
                return !listener.tx.is_closed();
            }
            listener.tx.send(Ok(snapshot.clone())).is_ok()
        });

        let documents = &self.documents;
        self.collection_listeners.retain(|listener| {
            let relevant = before.is_some_and(|fields| listener.query.matches(path, fields))
                || after.is_some_and(|fields| listener.query.matches(path, fields));
            if !relevant {
                return !listener.tx.is_closed();
            }
            listener
                .tx
                .send(Ok(run_query(documents, &listener.query)))
                .is_ok()
        });
    }
}

fn run_query(documents: &BTreeMap<DocumentPath, Fields>, query: &CollectionQuery) -> Vec<Document> {
    documents
        .iter()
        .filter(|(path, fields)| query.matches(path, fields))
        .map(|(path, fields)| Document::new(path.clone(), fields.clone()))
        .collect()
}

fn failed_stream<T: Send + 'static>(error: StoreError) -> SnapshotStream<T> {
    stream::iter(vec![Err(error)]).boxed()
}

/// Document store kept entirely in process memory.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    state: Mutex<MemoryState>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `times` operations of kind `op` under `path_prefix` fail.
    pub fn fail_next(
        &self,
        op: StoreOp,
        path_prefix: impl Into<String>,
        times: usize,
        error: StoreError,
    ) {
        if times == 0 {
            return;
        }
        self.lock().faults.push(Fault {
            op,
            path_prefix: path_prefix.into(),
            remaining: times,
            error,
        });
    }

    /// Pushes `error` into every live listener under `path_prefix` and drops
    /// those listeners, as a remote listener does when its channel breaks.
    ///
    /// Returns the number of listeners that were broken.
    pub fn break_subscriptions(&self, path_prefix: &str, error: StoreError) -> usize {
        let mut state = self.lock();
        let mut broken = 0;
        state.document_listeners.retain(|listener| {
            if !listener.path.starts_with(path_prefix) {
                return true;
            }
            let _ = listener.tx.send(Err(error.clone()));
            broken += 1;
            false
        });
        state.collection_listeners.retain(|listener| {
            if !listener.query.collection.as_str().starts_with(path_prefix) {
                return true;
            }
            let _ = listener.tx.send(Err(error.clone()));
            broken += 1;
            false
        });
        broken
    }

    /// Number of listeners whose stream is still alive.
    pub fn active_subscriptions(&self) -> usize {
        let mut state = self.lock();
        state
            .document_listeners
            .retain(|listener| !listener.tx.is_closed());
        state
            .collection_listeners
            .retain(|listener| !listener.tx.is_closed());
        state.document_listeners.len() + state.collection_listeners.len()
    }

    pub fn delta_log(&self) -> Vec<DeltaRecord> {
        self.lock().deltas.clone()
    }

    /// Deltas applied to `path`, in application order.
    pub fn deltas_for(&self, path: &DocumentPath) -> Vec<i64> {
        self.lock()
            .deltas
            .iter()
            .filter(|record| &record.path == path)
            .map(|record| record.delta)
            .collect()
    }

    /// Pins the store clock. Each read advances it by one millisecond.
    pub fn set_clock_ms(&self, now_ms: i64) {
        self.lock().manual_clock_ms = Some(now_ms);
    }

    pub fn document_count(&self, collection: &CollectionPath) -> usize {
        self.lock()
            .documents
            .keys()
            .filter(|path| path.collection() == collection)
            .count()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn subscribe_collection(&self, query: CollectionQuery) -> SnapshotStream<Vec<Document>> {
        let mut state = self.lock();
        if let Some(error) = state.take_fault(StoreOp::Subscribe, query.collection.as_str()) {
            return failed_stream(error);
        }

        let (tx, rx) = unbounded_channel();
        let _ = tx.send(Ok(run_query(&state.documents, &query)));
        debug!(
            "event=subscribe module=store status=ok kind=collection path={}",
            query.collection
        );
        state.collection_listeners.push(CollectionListener { query, tx });
        UnboundedReceiverStream::new(rx).boxed()
    }

    fn subscribe_document(&self, path: DocumentPath) -> SnapshotStream<Option<Document>> {
        let mut state = self.lock();
        if let Some(error) = state.take_fault(StoreOp::Subscribe, &path.to_string()) {
            return failed_stream(error);
        }

        let (tx, rx) = unbounded_channel();
        let _ = tx.send(Ok(state.document(&path)));
        debug!(
            "event=subscribe module=store status=ok kind=document path={}",
            path
        );
        state.document_listeners.push(DocumentListener { path, tx });
        UnboundedReceiverStream::new(rx).boxed()
    }

    fn allocate_path(&self, collection: &CollectionPath) -> DocumentPath {
        collection.doc(Uuid::new_v4().simple().to_string())
    }

    fn server_time_ms(&self) -> i64 {
        let mut state = self.lock();
        if let Some(now) = state.manual_clock_ms.as_mut() {
            let current = *now;
            *now += 1;
            return current;
        }
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }

    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        let mut state = self.lock();
        if let Some(error) = state.take_fault(StoreOp::Get, &path.to_string()) {
            return Err(error);
        }
        Ok(state.document(path))
    }

    async fn get_collection(&self, query: &CollectionQuery) -> StoreResult<Vec<Document>> {
        let mut state = self.lock();
        if let Some(error) = state.take_fault(StoreOp::Query, query.collection.as_str()) {
            return Err(error);
        }
        Ok(run_query(&state.documents, query))
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        let mut state = self.lock();
        if let Some(error) = state.take_fault(StoreOp::Set, &path.to_string()) {
            return Err(error);
        }
        state.commit(path, Some(fields));
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, patch: FieldPatch) -> StoreResult<()> {
        let mut state = self.lock();
        if let Some(error) = state.take_fault(StoreOp::Update, &path.to_string()) {
            return Err(error);
        }
        let mut fields = state
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::not_found(path))?;
        patch.apply_to(&mut fields);
        state.commit(path, Some(fields));
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> StoreResult<DeleteOutcome> {
        let mut state = self.lock();
        if let Some(error) = state.take_fault(StoreOp::Delete, &path.to_string()) {
            return Err(error);
        }
        if !state.documents.contains_key(path) {
            return Ok(DeleteOutcome::Missing);
        }
        state.commit(path, None);
        Ok(DeleteOutcome::Deleted)
    }

    async fn apply_numeric_delta(
        &self,
        path: &DocumentPath,
        field: &str,
        delta: i64,
    ) -> StoreResult<()> {
        let mut state = self.lock();
        if let Some(error) = state.take_fault(StoreOp::Delta, &path.to_string()) {
            return Err(error);
        }
        let mut fields = state
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::not_found(path))?;
        let current = match fields.get(field) {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                StoreError::InvalidData(format!("field `{field}` of `{path}` is not an integer"))
            })?,
        };
        fields.insert(field.to_string(), Value::from(current + delta));
        state.deltas.push(DeltaRecord {
            path: path.clone(),
            field: field.to_string(),
            delta,
        });
        state.commit(path, Some(fields));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryDocumentStore, StoreOp};
    use crate::store::document::{board, boards, CollectionQuery, DeleteOutcome, FieldPatch, Fields};
    use crate::store::source::{DocumentStore, StoreError};
    use futures::StreamExt;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().expect("object literal")
    }

    #[tokio::test]
    async fn document_subscription_emits_current_then_changes() {
        let store = InMemoryDocumentStore::new();
        let mut stream = store.subscribe_document(board("b1"));
        assert_eq!(stream.next().await, Some(Ok(None)));

        store
            .set(&board("b1"), fields(json!({ "name": "Trip" })))
            .await
            .expect("set should succeed");
        let snapshot = stream.next().await.expect("item").expect("ok");
        assert_eq!(snapshot.expect("exists").fields["name"], "Trip");

        store.delete(&board("b1")).await.expect("delete should succeed");
        assert_eq!(stream.next().await, Some(Ok(None)));
    }

    #[tokio::test]
    async fn collection_listener_ignores_unrelated_documents() {
        let store = InMemoryDocumentStore::new();
        let query = CollectionQuery::array_contains(boards(), "memberIds", "u1");
        let mut stream = store.subscribe_collection(query);
        assert_eq!(stream.next().await, Some(Ok(Vec::new())));

        store
            .set(&board("other"), fields(json!({ "memberIds": ["u2"] })))
            .await
            .unwrap();
        store
            .set(&board("mine"), fields(json!({ "memberIds": ["u1"] })))
            .await
            .unwrap();

        let snapshot = stream.next().await.expect("item").expect("ok");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), "mine");
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids_in_collection() {
        let store = InMemoryDocumentStore::new();
        let first = store.create(&boards(), fields(json!({ "name": "A" }))).await.unwrap();
        let second = store.create(&boards(), fields(json!({ "name": "B" }))).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(first.collection(), &boards());
        assert_eq!(store.document_count(&boards()), 2);
    }

    #[tokio::test]
    async fn delete_reports_missing_documents() {
        let store = InMemoryDocumentStore::new();
        store.set(&board("b1"), Fields::new()).await.unwrap();
        assert_eq!(store.delete(&board("b1")).await, Ok(DeleteOutcome::Deleted));
        assert_eq!(store.delete(&board("b1")).await, Ok(DeleteOutcome::Missing));
    }

    #[tokio::test]
    async fn numeric_delta_requires_document_and_is_logged() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .apply_numeric_delta(&board("b1"), "taskCount", 1)
            .await
            .expect_err("missing document must fail");
        assert!(matches!(err, StoreError::NotFound(_)));

        store.set(&board("b1"), Fields::new()).await.unwrap();
        store.apply_numeric_delta(&board("b1"), "taskCount", 1).await.unwrap();
        store.apply_numeric_delta(&board("b1"), "taskCount", 1).await.unwrap();
        store.apply_numeric_delta(&board("b1"), "taskCount", -1).await.unwrap();

        let doc = store.get(&board("b1")).await.unwrap().expect("exists");
        assert_eq!(doc.fields["taskCount"], 1);
        assert_eq!(store.deltas_for(&board("b1")), vec![1, 1, -1]);
    }

    #[tokio::test]
    async fn update_on_missing_document_fails_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .update(&board("nope"), FieldPatch::new().set("name", "x"))
            .await
            .expect_err("update must fail");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn injected_faults_fire_the_requested_number_of_times() {
        let store = InMemoryDocumentStore::new();
        store.fail_next(
            StoreOp::Set,
            "boards/b1",
            1,
            StoreError::Unavailable("offline".to_string()),
        );
        assert!(store.set(&board("b1"), Fields::new()).await.is_err());
        assert!(store.set(&board("b1"), Fields::new()).await.is_ok());
    }

    #[tokio::test]
    async fn dropped_streams_release_listeners() {
        let store = InMemoryDocumentStore::new();
        let doc_stream = store.subscribe_document(board("b1"));
        let coll_stream = store.subscribe_collection(CollectionQuery::all(boards()));
        assert_eq!(store.active_subscriptions(), 2);

        drop(doc_stream);
        drop(coll_stream);
        assert_eq!(store.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn broken_subscription_delivers_error_then_ends() {
        let store = InMemoryDocumentStore::new();
        let mut stream = store.subscribe_document(board("b1"));
        assert_eq!(stream.next().await, Some(Ok(None)));

        let broken = store.break_subscriptions("boards", StoreError::Unavailable("down".into()));
        assert_eq!(broken, 1);
        assert!(matches!(stream.next().await, Some(Err(StoreError::Unavailable(_)))));
        assert_eq!(stream.next().await, None);
    }

    #[test]
    fn manual_clock_advances_per_read() {
        let store = InMemoryDocumentStore::new();
        store.set_clock_ms(100);
        assert_eq!(store.server_time_ms(), 100);
        assert_eq!(store.server_time_ms(), 101);
    }
}
