//! Boards list screen for the signed-in user.

use crate::error::{CoreError, CoreResult};
use crate::model::board::{Board, BoardType};
use crate::screen::{failed_immediately, starting_with};
use crate::service::board_service::BoardService;
use crate::settings::CoreSettings;
use crate::store::source::{DocumentStore, StoreError};
use crate::sync::combine::{watch_source, CombineLatest, SlotSet};
use crate::sync::streams::member_board_snapshots;
use crate::view::boards::{reduce_boards, BoardsParams, BoardsState};
use crate::view::sort::BoardSortOption;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use log::warn;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Default)]
struct BoardsSlots {
    boards: Option<Vec<Board>>,
    params: Option<BoardsParams>,
}

enum BoardsUpdate {
    Boards(Vec<Board>),
    Params(BoardsParams),
}

impl SlotSet for BoardsSlots {
    type Update = BoardsUpdate;
    type Output = BoardsState;

    fn apply(&mut self, update: BoardsUpdate) {
        match update {
            BoardsUpdate::Boards(boards) => self.boards = Some(boards),
            BoardsUpdate::Params(params) => self.params = Some(params),
        }
    }

    fn snapshot(&self) -> Option<BoardsState> {
        Some(reduce_boards(self.boards.as_deref()?, self.params.as_ref()?))
    }
}

pub struct BoardsScreen<S: DocumentStore + ?Sized> {
    service: BoardService<S>,
    params: Arc<watch::Sender<BoardsParams>>,
}

impl<S: DocumentStore + ?Sized + 'static> BoardsScreen<S> {
    pub fn new(service: BoardService<S>, settings: &CoreSettings) -> Self {
        let (params, _) = watch::channel(settings.boards_params());
        Self {
            service,
            params: Arc::new(params),
        }
    }

    pub fn params(&self) -> BoardsParams {
        self.params.borrow().clone()
    }

    /// Live list of the boards the signed-in user belongs to.
    pub fn states(&self) -> BoxStream<'static, BoardsState> {
        let loading = BoardsState::loading(&self.params.borrow());
        let Some(user_id) = self.service.current_user_id() else {
            let failed = BoardsState::failed(
                None,
                &self.params.borrow(),
                CoreError::Unauthenticated.to_string(),
            );
            return failed_immediately(loading, failed);
        };

        let combined = CombineLatest::<BoardsSlots, StoreError>::new()
            .with_source(
                member_board_snapshots(self.service.store().as_ref(), &user_id),
                BoardsUpdate::Boards,
            )
            .with_source(watch_source(self.params.subscribe()), BoardsUpdate::Params);

        let params = Arc::clone(&self.params);
        let updates = combined.scan(None::<BoardsState>, move |last_good, item| {
            let state = match item {
                Ok(state) => {
                    *last_good = Some(state.clone());
                    state
                }
                Err(err) => {
                    warn!(
                        "event=boards_stream module=screen status=error user_id={} error={}",
                        user_id, err
                    );
                    let current = params.borrow().clone();
                    BoardsState::failed(last_good.take(), &current, CoreError::from(err).to_string())
                }
            };
            future::ready(Some(state))
        });

        starting_with(loading, updates)
    }

    pub fn set_search(&self, query: &str) {
        self.params.send_if_modified(|params| {
            let changed = params.search != query;
            if changed {
                params.search = query.to_string();
            }
            changed
        });
    }

    pub fn set_sort(&self, sort: BoardSortOption) {
        self.params.send_if_modified(|params| {
            let changed = params.sort != sort;
            params.sort = sort;
            changed
        });
    }

    pub fn clear_error(&self) {
        self.params
            .send_if_modified(|params| params.error_message.take().is_some());
    }

    pub async fn create_board(&self, name: &str, description: &str, kind: BoardType) -> CoreResult<Board> {
        let result = self.service.create_board(name, description, kind).await;
        self.record(result)
    }

    pub async fn update_board(&self, board_id: &str, name: &str, description: &str) -> CoreResult<()> {
        let result = self.service.update_board(board_id, name, description).await;
        self.record(result)
    }

    pub async fn join_board(&self, board_id: &str) -> CoreResult<()> {
        let result = self.service.join_board(board_id).await;
        self.record(result)
    }

    pub async fn delete_board(&self, board_id: &str) -> CoreResult<usize> {
        let result = self.service.delete_board(board_id).await;
        self.record(result)
    }

    /// Surfaces a failed intent in the next state as well as to the caller.
    fn record<T>(&self, result: CoreResult<T>) -> CoreResult<T> {
        if let Err(err) = &result {
            let message = err.to_string();
            self.params
                .send_modify(|params| params.error_message = Some(message));
        }
        result
    }
}
