//! Board detail reducer: one board, its tasks and its members.
//!
//! # Responsibility
//! - Project the latest board/tasks/members snapshots into a view state.
//! - Compute completion and cost aggregates from the live task collection.
//! - Decide when the "all done" celebration fires.
//!
//! # Invariants
//! - `progress` is in `[0, 1]` and is `0` for an empty board.
//! - Aggregates cover every live task, independent of the search filter.
//! - The celebration fires only when a toggle-to-done armed by this view is
//!   observed completing the board. Re-sorts and refreshes never arm it.

use crate::model::board::{Board, BoardType};
use crate::model::member::User;
use crate::model::task::Task;
use crate::model::TaskId;
use crate::view::sort::{visible_tasks, TaskSortOption};

/// Label shown for tasks without a resolvable assignee.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Client-local parameters of the board detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardDetailParams {
    pub sort: TaskSortOption,
    pub search: String,
    /// User preference gating the celebration.
    pub celebrations_enabled: bool,
    /// Task this view just toggled to done, awaiting its snapshot.
    pub armed_completion: Option<TaskId>,
    /// Bumped on every arm; a state stream celebrates each generation once.
    pub arm_generation: u64,
}

impl Default for BoardDetailParams {
    fn default() -> Self {
        Self {
            sort: TaskSortOption::default(),
            search: String::new(),
            celebrations_enabled: true,
            armed_completion: None,
            arm_generation: 0,
        }
    }
}

/// Completion and cost figures derived from a task collection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskAggregates {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub progress: f64,
    pub total_cost: f64,
}

impl TaskAggregates {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total_tasks = tasks.len();
        let completed_tasks = tasks.iter().filter(|task| task.is_done).count();
        let progress = if total_tasks == 0 {
            0.0
        } else {
            completed_tasks as f64 / total_tasks as f64
        };
        Self {
            total_tasks,
            completed_tasks,
            progress,
            total_cost: tasks.iter().map(|task| task.price).sum(),
        }
    }

    /// Non-empty and every task done.
    pub fn all_complete(&self) -> bool {
        self.total_tasks > 0 && self.completed_tasks == self.total_tasks
    }
}

/// Immutable view state of the board detail screen.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardDetailState {
    pub is_loading: bool,
    /// `None` once the board no longer exists.
    pub board: Option<Board>,
    /// Filtered and sorted tasks.
    pub tasks: Vec<Task>,
    pub members: Vec<User>,
    pub aggregates: TaskAggregates,
    /// `board.task_count` minus the live task count.
    pub task_count_drift: Option<i64>,
    pub sort: TaskSortOption,
    pub search: String,
    pub show_celebration: bool,
    pub error_message: Option<String>,
}

impl BoardDetailState {
    /// Initial state shown before every source has reported.
    pub fn loading(params: &BoardDetailParams) -> Self {
        Self {
            is_loading: true,
            board: None,
            tasks: Vec::new(),
            members: Vec::new(),
            aggregates: TaskAggregates::default(),
            task_count_drift: None,
            sort: params.sort,
            search: params.search.clone(),
            show_celebration: false,
            error_message: None,
        }
    }

    /// Error state keeping the last good data for redisplay.
    pub fn failed(last_good: Option<Self>, params: &BoardDetailParams, message: String) -> Self {
        let mut state = last_good.unwrap_or_else(|| Self::loading(params));
        state.is_loading = false;
        state.show_celebration = false;
        state.error_message = Some(message);
        state
    }

    pub fn total_tasks(&self) -> usize {
        self.aggregates.total_tasks
    }

    pub fn completed_tasks(&self) -> usize {
        self.aggregates.completed_tasks
    }

    pub fn progress(&self) -> f64 {
        self.aggregates.progress
    }

    pub fn total_cost(&self) -> f64 {
        self.aggregates.total_cost
    }

    pub fn is_grocery(&self) -> bool {
        self.board
            .as_ref()
            .is_some_and(|board| board.kind == BoardType::Grocery)
    }

    /// Loaded without error, but the board document is gone.
    pub fn board_missing(&self) -> bool {
        !self.is_loading && self.error_message.is_none() && self.board.is_none()
    }

    /// Resolves the task assignee against the current member set.
    pub fn assignee_of(&self, task: &Task) -> Option<&User> {
        let assignee = task.assigned_to.as_deref()?;
        self.members.iter().find(|member| member.id == assignee)
    }

    /// Display label for the assignee; dangling ids read as unassigned.
    pub fn assignee_label(&self, task: &Task) -> &str {
        self.assignee_of(task)
            .map(|member| member.name.as_str())
            .unwrap_or(UNASSIGNED_LABEL)
    }
}

/// Reduces the latest snapshots and parameters into a view state.
pub fn reduce_board_detail(
    board: Option<&Board>,
    tasks: &[Task],
    members: &[User],
    params: &BoardDetailParams,
) -> BoardDetailState {
    let aggregates = TaskAggregates::from_tasks(tasks);
    let show_celebration = params.celebrations_enabled
        && aggregates.all_complete()
        && params
            .armed_completion
            .as_deref()
            .is_some_and(|armed| tasks.iter().any(|task| task.id == armed && task.is_done));

    BoardDetailState {
        is_loading: false,
        board: board.cloned(),
        tasks: visible_tasks(tasks, &params.search, params.sort),
        members: members.to_vec(),
        aggregates,
        task_count_drift: board.map(|board| board.task_count - aggregates.total_tasks as i64),
        sort: params.sort,
        search: params.search.clone(),
        show_celebration,
        error_message: None,
    }
}

/// Returns whether an armed completion has been resolved by `tasks`.
///
/// Resolved means the armed task is observed done (whether or not that
/// completed the board) or has disappeared.
pub fn completion_latch_settled(armed: &str, tasks: &[Task]) -> bool {
    match tasks.iter().find(|task| task.id == armed) {
        Some(task) => task.is_done,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        completion_latch_settled, reduce_board_detail, BoardDetailParams, BoardDetailState,
        TaskAggregates, UNASSIGNED_LABEL,
    };
    use crate::model::board::{Board, BoardType};
    use crate::model::member::User;
    use crate::model::task::Task;

    fn task(id: &str, done: bool, price: f64) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            is_done: done,
            price,
            ..Task::default()
        }
    }

    #[test]
    fn empty_board_has_zero_progress() {
        let aggregates = TaskAggregates::from_tasks(&[]);
        assert_eq!(aggregates.total_tasks, 0);
        assert_eq!(aggregates.progress, 0.0);
        assert!(!aggregates.all_complete());
    }

    #[test]
    fn aggregates_ignore_search_filter_and_board_hint() {
        let mut board = Board::new_owned("b1", "Trip", "", BoardType::Grocery, "u1").unwrap();
        board.task_count = 10;
        let tasks = vec![task("milk", true, 3.5), task("eggs", false, 2.0)];
        let params = BoardDetailParams {
            search: "milk".to_string(),
            ..BoardDetailParams::default()
        };

        let state = reduce_board_detail(Some(&board), &tasks, &[], &params);
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.total_tasks(), 2);
        assert_eq!(state.completed_tasks(), 1);
        assert_eq!(state.total_cost(), 5.5);
        assert_eq!(state.task_count_drift, Some(8));
        assert!(state.is_grocery());
    }

    #[test]
    fn celebration_requires_armed_task_completing_the_board() {
        let tasks = vec![task("a", true, 0.0), task("b", true, 0.0)];
        let unarmed = reduce_board_detail(None, &tasks, &[], &BoardDetailParams::default());
        assert!(!unarmed.show_celebration);

        let armed = BoardDetailParams {
            armed_completion: Some("b".to_string()),
            ..BoardDetailParams::default()
        };
        assert!(reduce_board_detail(None, &tasks, &[], &armed).show_celebration);

        let disabled = BoardDetailParams {
            celebrations_enabled: false,
            ..armed.clone()
        };
        assert!(!reduce_board_detail(None, &tasks, &[], &disabled).show_celebration);

        let partial = vec![task("a", false, 0.0), task("b", true, 0.0)];
        assert!(!reduce_board_detail(None, &partial, &[], &armed).show_celebration);
    }

    #[test]
    fn latch_settles_once_armed_task_is_done_or_gone() {
        let open = vec![task("a", false, 0.0)];
        assert!(!completion_latch_settled("a", &open));
        let done = vec![task("a", true, 0.0)];
        assert!(completion_latch_settled("a", &done));
        assert!(completion_latch_settled("a", &[]));
    }

    #[test]
    fn dangling_assignee_reads_as_unassigned() {
        let member = User::from_sign_in("u1", "ada@x.io");
        let mut assigned = task("a", false, 0.0);
        assigned.assigned_to = Some("u1".to_string());
        let mut dangling = task("b", false, 0.0);
        dangling.assigned_to = Some("gone".to_string());

        let state = reduce_board_detail(
            None,
            &[assigned.clone(), dangling.clone()],
            &[member],
            &BoardDetailParams::default(),
        );
        assert_eq!(state.assignee_label(&assigned), "ada");
        assert_eq!(state.assignee_label(&dangling), UNASSIGNED_LABEL);
    }

    #[test]
    fn failed_state_keeps_last_good_data() {
        let params = BoardDetailParams::default();
        let good = reduce_board_detail(None, &[task("a", false, 1.0)], &[], &params);
        let failed = BoardDetailState::failed(Some(good), &params, "offline".to_string());
        assert_eq!(failed.total_tasks(), 1);
        assert_eq!(failed.error_message.as_deref(), Some("offline"));
        assert!(!failed.board_missing());
    }
}
