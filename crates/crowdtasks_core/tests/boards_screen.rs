use crowdtasks_core::store::memory::StoreOp;
use crowdtasks_core::{
    BoardService, BoardSortOption, BoardType, BoardsScreen, BoardsState, CoreError, CoreSettings,
    InMemoryDocumentStore, SharedSession, StoreError,
};
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;

fn screen_for(store: &Arc<InMemoryDocumentStore>, session: Arc<SharedSession>) -> BoardsScreen<InMemoryDocumentStore> {
    let service = BoardService::new(Arc::clone(store), session);
    BoardsScreen::new(service, &CoreSettings::default())
}

fn drain(states: &mut BoxStream<'static, BoardsState>) -> Vec<BoardsState> {
    let mut drained = Vec::new();
    while let Some(Some(state)) = states.next().now_or_never() {
        drained.push(state);
    }
    drained
}

fn names(state: &BoardsState) -> Vec<&str> {
    state.boards.iter().map(|board| board.name.as_str()).collect()
}

#[tokio::test]
async fn lists_only_boards_the_user_belongs_to() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let mine = screen_for(&store, Arc::new(SharedSession::signed_in("u1")));
    let theirs = screen_for(&store, Arc::new(SharedSession::signed_in("u2")));

    let mut states = mine.states();
    let first = drain(&mut states);
    assert!(first[0].is_loading);
    assert!(first.last().unwrap().boards.is_empty());

    mine.create_board("Groceries", "", BoardType::Grocery)
        .await
        .unwrap();
    let shared = theirs
        .create_board("Trip", "", BoardType::Default)
        .await
        .unwrap();
    assert_eq!(names(drain(&mut states).last().unwrap()), ["Groceries"]);

    mine.join_board(&shared.id).await.unwrap();
    assert_eq!(
        names(drain(&mut states).last().unwrap()),
        ["Groceries", "Trip"]
    );
}

#[tokio::test]
async fn search_and_sort_apply_to_the_list() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let session = Arc::new(SharedSession::signed_in("u1"));
    let screen = screen_for(&store, Arc::clone(&session));
    let service = BoardService::new(Arc::clone(&store), session);
    let busy = screen
        .create_board("Party", "", BoardType::Default)
        .await
        .unwrap();
    screen
        .create_board("Pantry", "", BoardType::Grocery)
        .await
        .unwrap();
    screen
        .create_board("Office", "", BoardType::Default)
        .await
        .unwrap();
    for title in ["cake", "balloons"] {
        service.add_task(&busy.id, title).await.unwrap();
    }

    let mut states = screen.states();
    assert_eq!(
        names(drain(&mut states).last().unwrap()),
        ["Office", "Pantry", "Party"]
    );

    screen.set_sort(BoardSortOption::TaskCountDesc);
    screen.set_search("pa");
    let state = drain(&mut states).pop().unwrap();
    assert_eq!(names(&state), ["Party", "Pantry"]);
    assert_eq!(state.all_boards.len(), 3);
    assert_eq!(state.sort, BoardSortOption::TaskCountDesc);
}

#[tokio::test]
async fn failed_intent_is_surfaced_until_cleared() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let screen = screen_for(&store, Arc::new(SharedSession::signed_in("u1")));
    let mut states = screen.states();
    drain(&mut states);

    store.fail_next(
        StoreOp::Set,
        "boards",
        1,
        StoreError::Unavailable("offline".to_string()),
    );
    let result = screen.create_board("Trip", "", BoardType::Default).await;
    assert_eq!(result, Err(CoreError::TransientIo("offline".to_string())));
    let state = drain(&mut states).pop().unwrap();
    assert!(state.error_message.unwrap().contains("offline"));

    screen.clear_error();
    assert_eq!(drain(&mut states).pop().unwrap().error_message, None);
}

#[tokio::test]
async fn signed_out_user_gets_an_error_state() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let screen = screen_for(&store, Arc::new(SharedSession::new()));
    let emitted = screen.states().collect::<Vec<_>>().await;

    assert_eq!(emitted.len(), 2);
    assert!(emitted[0].is_loading);
    assert_eq!(
        emitted[1].error_message.as_deref(),
        Some(CoreError::Unauthenticated.to_string().as_str())
    );
    assert_eq!(store.active_subscriptions(), 0);
}

#[tokio::test]
async fn stream_error_keeps_cached_boards() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let screen = screen_for(&store, Arc::new(SharedSession::signed_in("u1")));
    screen
        .create_board("Groceries", "", BoardType::Grocery)
        .await
        .unwrap();
    let mut states = screen.states();
    drain(&mut states);

    store.break_subscriptions("boards", StoreError::Unavailable("reset".to_string()));
    let state = drain(&mut states).pop().unwrap();
    assert_eq!(names(&state), ["Groceries"]);
    assert!(state.error_message.is_some());
    assert!(!state.is_loading);
}
