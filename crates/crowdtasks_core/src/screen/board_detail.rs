//! Board detail screen: one board, its tasks and members.
//!
//! # Invariants
//! - Aggregates follow the live task collection; search only narrows the
//!   displayed list.
//! - `toggle_task` arms the completion latch before writing, under a fresh
//!   arm generation. Each state stream celebrates a generation at most once,
//!   even when further snapshots arrive before the disarm reaches it.

use crate::error::{CoreError, CoreResult};
use crate::model::board::Board;
use crate::model::member::User;
use crate::model::task::Task;
use crate::model::BoardId;
use crate::screen::starting_with;
use crate::service::board_service::{BoardService, TaskDetails};
use crate::settings::CoreSettings;
use crate::store::document::DeleteOutcome;
use crate::store::source::{DocumentStore, StoreError};
use crate::sync::combine::{watch_source, CombineLatest, SlotSet};
use crate::sync::streams::{board_snapshots, member_snapshots, task_snapshots};
use crate::view::board_detail::{
    completion_latch_settled, reduce_board_detail, BoardDetailParams, BoardDetailState,
};
use crate::view::sort::TaskSortOption;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Default)]
struct DetailSlots {
    board: Option<Option<Board>>,
    tasks: Option<Vec<Task>>,
    members: Option<Vec<User>>,
    params: Option<BoardDetailParams>,
}

enum DetailUpdate {
    Board(Option<Board>),
    Tasks(Vec<Task>),
    Members(Vec<User>),
    Params(BoardDetailParams),
}

struct DetailInputs {
    board: Option<Board>,
    tasks: Vec<Task>,
    members: Vec<User>,
    params: BoardDetailParams,
}

impl SlotSet for DetailSlots {
    type Update = DetailUpdate;
    type Output = DetailInputs;

    fn apply(&mut self, update: DetailUpdate) {
        match update {
            DetailUpdate::Board(board) => self.board = Some(board),
            DetailUpdate::Tasks(tasks) => self.tasks = Some(tasks),
            DetailUpdate::Members(members) => self.members = Some(members),
            DetailUpdate::Params(params) => self.params = Some(params),
        }
    }

    fn snapshot(&self) -> Option<DetailInputs> {
        Some(DetailInputs {
            board: self.board.clone()?,
            tasks: self.tasks.clone()?,
            members: self.members.clone()?,
            params: self.params.clone()?,
        })
    }
}

/// State carried from one emission of a `states()` stream to the next.
#[derive(Default)]
struct StreamMemory {
    last_good: Option<BoardDetailState>,
    /// Arm generation this stream has already celebrated.
    celebrated: Option<u64>,
}

pub struct BoardDetailScreen<S: DocumentStore + ?Sized> {
    board_id: BoardId,
    service: BoardService<S>,
    params: Arc<watch::Sender<BoardDetailParams>>,
}

impl<S: DocumentStore + ?Sized + 'static> BoardDetailScreen<S> {
    pub fn new(service: BoardService<S>, board_id: impl Into<BoardId>, settings: &CoreSettings) -> Self {
        let (params, _) = watch::channel(settings.board_detail_params());
        Self {
            board_id: board_id.into(),
            service,
            params: Arc::new(params),
        }
    }

    pub fn params(&self) -> BoardDetailParams {
        self.params.borrow().clone()
    }

    /// Live view states of this board.
    pub fn states(&self) -> BoxStream<'static, BoardDetailState> {
        let store = self.service.store();
        let combined = CombineLatest::<DetailSlots, StoreError>::new()
            .with_source(board_snapshots(store.as_ref(), &self.board_id), DetailUpdate::Board)
            .with_source(task_snapshots(store.as_ref(), &self.board_id), DetailUpdate::Tasks)
            .with_source(
                member_snapshots(Arc::clone(store), &self.board_id),
                DetailUpdate::Members,
            )
            .with_source(watch_source(self.params.subscribe()), DetailUpdate::Params);

        let params = Arc::clone(&self.params);
        let board_id = self.board_id.clone();
        let updates = combined.scan(StreamMemory::default(), move |memory, item| {
            let state = match item {
                Ok(inputs) => {
                    let state = reduce_inputs(&inputs, &params, &board_id, &mut memory.celebrated);
                    memory.last_good = Some(state.clone());
                    state
                }
                Err(err) => {
                    warn!(
                        "event=board_detail_stream module=screen status=error board_id={} error={}",
                        board_id, err
                    );
                    let current = params.borrow().clone();
                    BoardDetailState::failed(
                        memory.last_good.take(),
                        &current,
                        CoreError::from(err).to_string(),
                    )
                }
            };
            future::ready(Some(state))
        });

        starting_with(BoardDetailState::loading(&self.params.borrow()), updates)
    }

    pub fn set_sort(&self, sort: TaskSortOption) {
        self.params.send_if_modified(|params| {
            let changed = params.sort != sort;
            params.sort = sort;
            changed
        });
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

    /// Flips the task's done flag.
    ///
    /// Marking a task done arms the completion latch first, so the snapshot
    /// that completes the board can fire the celebration.
    pub async fn toggle_task(&self, task: &Task) -> CoreResult<()> {
        let is_done = !task.is_done;
        if is_done {
            let armed = task.id.clone();
            self.params.send_modify(|params| {
                params.armed_completion = Some(armed);
                params.arm_generation += 1;
            });
        }
        let result = self
            .service
            .toggle_task(&self.board_id, &task.id, is_done)
            .await;
        if result.is_err() && is_done {
            disarm(&self.params, &task.id);
        }
        result
    }

    pub async fn add_task(&self, title: &str) -> CoreResult<Task> {
        self.service.add_task(&self.board_id, title).await
    }

    pub async fn delete_task(&self, task_id: &str) -> CoreResult<DeleteOutcome> {
        self.service.delete_task(&self.board_id, task_id).await
    }

    pub async fn update_task_price(&self, task_id: &str, price: f64) -> CoreResult<()> {
        self.service
            .update_task_price(&self.board_id, task_id, price)
            .await
    }

    pub async fn update_task_details(&self, task_id: &str, details: &TaskDetails) -> CoreResult<()> {
        self.service
            .update_task_details(&self.board_id, task_id, details)
            .await
    }

    /// Assigns to `user_id`, or clears the assignment with `None`.
    pub async fn assign_task(&self, task_id: &str, user_id: Option<&str>) -> CoreResult<()> {
        match user_id {
            Some(user_id) => {
                self.service
                    .assign_task(&self.board_id, task_id, user_id)
                    .await
            }
            None => self.service.unassign_task(&self.board_id, task_id).await,
        }
    }
}

fn reduce_inputs(
    inputs: &DetailInputs,
    params: &watch::Sender<BoardDetailParams>,
    board_id: &str,
    celebrated: &mut Option<u64>,
) -> BoardDetailState {
    let mut state = reduce_board_detail(
        inputs.board.as_ref(),
        &inputs.tasks,
        &inputs.members,
        &inputs.params,
    );
    if state.show_celebration {
        let generation = inputs.params.arm_generation;
        if *celebrated == Some(generation) {
            state.show_celebration = false;
        } else {
            *celebrated = Some(generation);
        }
    }
    if let Some(armed) = inputs.params.armed_completion.as_deref() {
        if completion_latch_settled(armed, &inputs.tasks) {
            disarm(params, armed);
        }
    }
    if let Some(drift) = state.task_count_drift.filter(|drift| *drift != 0) {
        debug!(
            "event=task_count_drift module=screen status=observed board_id={} drift={}",
            board_id, drift
        );
    }
    state
}

/// Clears the latch only if it still points at `task_id`.
fn disarm(params: &watch::Sender<BoardDetailParams>, task_id: &str) {
    params.send_if_modified(|params| {
        if params.armed_completion.as_deref() == Some(task_id) {
            params.armed_completion = None;
            true
        } else {
            false
        }
    });
}
