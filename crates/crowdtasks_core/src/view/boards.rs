//! Boards list reducer.
//!
//! The list orders by the denormalized `task_count` hint because the list
//! never fetches task collections.

use crate::model::board::Board;
use crate::view::sort::{visible_boards, BoardSortOption};

/// Client-local parameters of the boards list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardsParams {
    pub search: String,
    pub sort: BoardSortOption,
    /// Last failed intent, cleared by the user.
    pub error_message: Option<String>,
}

/// Immutable view state of the boards list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardsState {
    pub is_loading: bool,
    /// Every board the user is a member of, in snapshot order.
    pub all_boards: Vec<Board>,
    /// Filtered and sorted boards.
    pub boards: Vec<Board>,
    pub search: String,
    pub sort: BoardSortOption,
    pub error_message: Option<String>,
}

impl BoardsState {
    pub fn loading(params: &BoardsParams) -> Self {
        Self {
            is_loading: true,
            all_boards: Vec::new(),
            boards: Vec::new(),
            search: params.search.clone(),
            sort: params.sort,
            error_message: None,
        }
    }

    /// Error state keeping the last good data for redisplay.
    pub fn failed(last_good: Option<Self>, params: &BoardsParams, message: String) -> Self {
        let mut state = last_good.unwrap_or_else(|| Self::loading(params));
        state.is_loading = false;
        state.error_message = Some(message);
        state
    }
}

pub fn reduce_boards(boards: &[Board], params: &BoardsParams) -> BoardsState {
    BoardsState {
        is_loading: false,
        all_boards: boards.to_vec(),
        boards: visible_boards(boards, &params.search, params.sort),
        search: params.search.clone(),
        sort: params.sort,
        error_message: params.error_message.clone(),
    }
}
