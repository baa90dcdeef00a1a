use crowdtasks_core::{
    CoreError, InMemoryDocumentStore, ProfileScreen, ProfileState, SharedSession, UserService,
};
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;

fn drain(states: &mut BoxStream<'static, ProfileState>) -> Vec<ProfileState> {
    let mut drained = Vec::new();
    while let Some(Some(state)) = states.next().now_or_never() {
        drained.push(state);
    }
    drained
}

#[tokio::test]
async fn profile_follows_renames() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let users = UserService::new(store, Arc::new(SharedSession::signed_in("u1")));
    users.ensure_profile("grace@example.com").await.unwrap();
    let screen = ProfileScreen::new(users);

    let mut states = screen.states();
    let first = drain(&mut states);
    assert!(first[0].is_loading);
    assert_eq!(first.last().unwrap().user.as_ref().unwrap().name, "grace");

    screen.update_user_name("Grace H").await.unwrap();
    let state = drain(&mut states).pop().unwrap();
    assert_eq!(state.user.unwrap().name, "Grace H");
    assert_eq!(state.error_message, None);
}

#[tokio::test]
async fn rejected_rename_is_surfaced_then_cleared_by_success() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let users = UserService::new(store, Arc::new(SharedSession::signed_in("u1")));
    users.ensure_profile("grace@example.com").await.unwrap();
    let screen = ProfileScreen::new(users);
    let mut states = screen.states();
    drain(&mut states);

    assert!(matches!(
        screen.update_user_name("  ").await,
        Err(CoreError::Validation(_))
    ));
    assert!(drain(&mut states).pop().unwrap().error_message.is_some());

    screen.update_user_name("Grace").await.unwrap();
    let state = drain(&mut states).pop().unwrap();
    assert_eq!(state.error_message, None);
    assert_eq!(state.user.unwrap().name, "Grace");
}

#[tokio::test]
async fn missing_profile_loads_as_none() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let screen = ProfileScreen::new(UserService::new(
        store,
        Arc::new(SharedSession::signed_in("u1")),
    ));
    let mut states = screen.states();
    let state = drain(&mut states).pop().unwrap();
    assert!(!state.is_loading);
    assert_eq!(state.user, None);
}
