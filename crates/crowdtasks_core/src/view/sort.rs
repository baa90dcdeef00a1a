//! Search filtering and sort policies for boards and tasks.

use crate::model::board::Board;
use crate::model::task::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort policy for the boards list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardSortOption {
    #[default]
    NameAsc,
    NameDesc,
    TaskCountAsc,
    TaskCountDesc,
}

/// Sort policy for a board's task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSortOption {
    /// Newest first by store creation time, then by descending id.
    #[default]
    Recent,
    AlphaAsc,
    AlphaDesc,
    CompletedFirst,
    IncompleteFirst,
}

/// Case-insensitive substring match; blank queries match everything.
///
/// A non-blank query is matched as typed, surrounding spaces included.
pub fn matches_search(text: &str, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    text.to_lowercase().contains(&query.to_lowercase())
}

fn by_lower(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

pub fn compare_boards(a: &Board, b: &Board, option: BoardSortOption) -> Ordering {
    let primary = match option {
        BoardSortOption::NameAsc => by_lower(&a.name, &b.name),
        BoardSortOption::NameDesc => by_lower(&b.name, &a.name),
        BoardSortOption::TaskCountAsc => a
            .task_count
            .cmp(&b.task_count)
            .then_with(|| by_lower(&a.name, &b.name)),
        BoardSortOption::TaskCountDesc => b
            .task_count
            .cmp(&a.task_count)
            .then_with(|| by_lower(&a.name, &b.name)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

pub fn compare_tasks(a: &Task, b: &Task, option: TaskSortOption) -> Ordering {
    match option {
        TaskSortOption::Recent => b
            .created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id)),
        TaskSortOption::AlphaAsc => by_lower(&a.title, &b.title).then_with(|| a.id.cmp(&b.id)),
        TaskSortOption::AlphaDesc => by_lower(&b.title, &a.title).then_with(|| a.id.cmp(&b.id)),
        TaskSortOption::CompletedFirst => b
            .is_done
            .cmp(&a.is_done)
            .then_with(|| by_lower(&a.title, &b.title))
            .then_with(|| a.id.cmp(&b.id)),
        TaskSortOption::IncompleteFirst => a
            .is_done
            .cmp(&b.is_done)
            .then_with(|| by_lower(&a.title, &b.title))
            .then_with(|| a.id.cmp(&b.id)),
    }
}

pub fn sort_boards(boards: &mut [Board], option: BoardSortOption) {
    boards.sort_by(|a, b| compare_boards(a, b, option));
}

pub fn sort_tasks(tasks: &mut [Task], option: TaskSortOption) {
    tasks.sort_by(|a, b| compare_tasks(a, b, option));
}

/// Boards whose name matches `query`, ordered by `option`.
pub fn visible_boards(boards: &[Board], query: &str, option: BoardSortOption) -> Vec<Board> {
    let mut visible = boards
        .iter()
        .filter(|board| matches_search(&board.name, query))
        .cloned()
        .collect::<Vec<_>>();
    sort_boards(&mut visible, option);
    visible
}

/// Tasks whose title matches `query`, ordered by `option`.
pub fn visible_tasks(tasks: &[Task], query: &str, option: TaskSortOption) -> Vec<Task> {
    let mut visible = tasks
        .iter()
        .filter(|task| matches_search(&task.title, query))
        .cloned()
        .collect::<Vec<_>>();
    sort_tasks(&mut visible, option);
    visible
}
