//! Typed snapshot sources built on top of raw store subscriptions.
//!
//! Collection snapshots skip documents that fail to decode (logged), so one
//! malformed document never blanks a whole list. Single-document snapshots
//! surface decode failures as errors.

use crate::model::board::{Board, MEMBER_IDS_FIELD};
use crate::model::member::User;
use crate::model::task::Task;
use crate::store::document::{self, CollectionQuery, Document};
use crate::store::source::{DocumentStore, SnapshotStream, StoreResult};
use futures::StreamExt;
use log::warn;
use serde_json::Value;
use std::sync::Arc;

fn decode_all<T>(docs: Vec<Document>, decode: fn(&Document) -> StoreResult<T>) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match decode(doc) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(
                    "event=snapshot_decode module=sync status=skipped path={} error={}",
                    doc.path, err
                );
                None
            }
        })
        .collect()
}

/// Live board document; `None` once the board does not exist.
pub fn board_snapshots<S>(store: &S, board_id: &str) -> SnapshotStream<Option<Board>>
where
    S: DocumentStore + ?Sized,
{
    store
        .subscribe_document(document::board(board_id))
        .map(|snapshot| {
            snapshot.and_then(|doc| doc.as_ref().map(Board::from_document).transpose())
        })
        .boxed()
}

/// Live task collection of one board.
pub fn task_snapshots<S>(store: &S, board_id: &str) -> SnapshotStream<Vec<Task>>
where
    S: DocumentStore + ?Sized,
{
    store
        .subscribe_collection(CollectionQuery::all(document::tasks(board_id)))
        .map(|snapshot| snapshot.map(|docs| decode_all(docs, Task::from_document)))
        .boxed()
}

/// Live list of boards `user_id` is a member of.
pub fn member_board_snapshots<S>(store: &S, user_id: &str) -> SnapshotStream<Vec<Board>>
where
    S: DocumentStore + ?Sized,
{
    let query = CollectionQuery::array_contains(document::boards(), MEMBER_IDS_FIELD, user_id);
    store
        .subscribe_collection(query)
        .map(|snapshot| snapshot.map(|docs| decode_all(docs, Board::from_document)))
        .boxed()
}

/// Live profile of one user; `None` when no profile exists.
pub fn user_snapshots<S>(store: &S, user_id: &str) -> SnapshotStream<Option<User>>
where
    S: DocumentStore + ?Sized,
{
    store
        .subscribe_document(document::user(user_id))
        .map(|snapshot| snapshot.and_then(|doc| doc.as_ref().map(User::from_document).transpose()))
        .boxed()
}

/// Member profiles of a board, re-resolved whenever the board changes.
///
/// Profiles are fetched one-shot per board snapshot and returned in
/// `member_ids` order. Ids without a profile are dropped.
pub fn member_snapshots<S>(store: Arc<S>, board_id: &str) -> SnapshotStream<Vec<User>>
where
    S: DocumentStore + ?Sized + 'static,
{
    board_snapshots(store.as_ref(), board_id)
        .then(move |snapshot| {
            let store = Arc::clone(&store);
            async move {
                match snapshot {
                    Ok(Some(board)) => resolve_members(store.as_ref(), &board.member_ids).await,
                    Ok(None) => Ok(Vec::new()),
                    Err(err) => Err(err),
                }
            }
        })
        .boxed()
}

/// Resolves member ids into profiles, preserving id order.
pub async fn resolve_members<S>(store: &S, member_ids: &[String]) -> StoreResult<Vec<User>>
where
    S: DocumentStore + ?Sized,
{
    if member_ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = member_ids
        .iter()
        .map(|id| Value::String(id.clone()))
        .collect::<Vec<_>>();
    let docs = store
        .get_collection(&CollectionQuery::field_in(document::users(), "id", ids))
        .await?;
    let mut profiles = decode_all(docs, User::from_document);
    profiles.sort_by_key(|user| {
        member_ids
            .iter()
            .position(|id| *id == user.id)
            .unwrap_or(usize::MAX)
    });
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::{member_snapshots, task_snapshots};
    use crate::model::board::{Board, BoardType};
    use crate::model::member::User;
    use crate::store::document::{self, FieldPatch, Fields};
    use crate::store::memory::InMemoryDocumentStore;
    use crate::store::source::DocumentStore;
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn task_snapshots_skip_malformed_documents() {
        let store = InMemoryDocumentStore::new();
        let mut good = Fields::new();
        good.insert("title".to_string(), json!("Milk"));
        let mut bad = Fields::new();
        bad.insert("isDone".to_string(), json!("not-a-bool"));
        store.set(&document::task("b1", "t1"), good).await.unwrap();
        store.set(&document::task("b1", "t2"), bad).await.unwrap();

        let tasks = task_snapshots(&store, "b1").next().await.unwrap().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "t1");
        assert_eq!(tasks[0].board_id, "b1");
    }

    #[tokio::test]
    async fn member_snapshots_follow_membership_changes() {
        let store = Arc::new(InMemoryDocumentStore::new());
        for (id, email) in [("u1", "ada@x.io"), ("u2", "bob@x.io")] {
            let user = User::from_sign_in(id, email);
            store
                .set(&document::user(id), user.to_fields().unwrap())
                .await
                .unwrap();
        }
        let board = Board::new_owned("b1", "Trip", "", BoardType::Default, "u1").unwrap();
        store
            .set(&document::board("b1"), board.to_fields().unwrap())
            .await
            .unwrap();

        let mut members = member_snapshots(Arc::clone(&store), "b1");
        let first = members.next().await.unwrap().unwrap();
        assert_eq!(first.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(), ["u1"]);

        store
            .update(
                &document::board("b1"),
                FieldPatch::new().array_union("memberIds", vec![json!("u2"), json!("ghost")]),
            )
            .await
            .unwrap();
        let second = members.next().await.unwrap().unwrap();
        assert_eq!(
            second.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(),
            ["u1", "u2"]
        );
    }
}
