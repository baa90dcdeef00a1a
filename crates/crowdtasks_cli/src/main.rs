//! CLI walkthrough of the sync engine against the in-memory store.
//!
//! # Responsibility
//! - Exercise core wiring end to end without a remote backend.
//! - Keep output deterministic for quick local sanity checks.

use clap::Parser;
use crowdtasks_core::{
    core_version, init_logging, BoardDetailScreen, BoardDetailState, BoardService, BoardType,
    BoardsScreen, CoreSettings, InMemoryDocumentStore, SharedSession, TaskSortOption, UserService,
};
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_USER_ID: &str = "demo-user";

#[derive(Parser)]
#[command(name = "crowdtasks")]
#[command(about = "Runs a scripted shared-board session on the in-memory store")]
struct Cli {
    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "CROWDTASKS_LOG_DIR")]
    log_dir: Option<String>,

    /// Overrides the level from settings.
    #[arg(long)]
    log_level: Option<String>,

    /// JSON settings file.
    #[arg(long, env = "CROWDTASKS_SETTINGS")]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => CoreSettings::load(path)?,
        None => CoreSettings::default(),
    };
    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or(settings.effective_log_level());
        init_logging(level, log_dir)?;
    }

    println!("crowdtasks_core version={}", core_version());

    let store = Arc::new(InMemoryDocumentStore::new());
    let session = Arc::new(SharedSession::signed_in(DEMO_USER_ID));
    let boards = BoardService::new(Arc::clone(&store), session.clone());
    let users = UserService::new(Arc::clone(&store), session);

    let profile = users.ensure_profile("demo@crowdtasks.app").await?;
    println!("profile name={}", profile.name);

    let list = BoardsScreen::new(boards.clone(), &settings);
    let mut list_states = list.states();
    let board = list
        .create_board("Weekend groceries", "Shared list", BoardType::Grocery)
        .await?;
    if let Some(state) = drain(&mut list_states) {
        println!("boards visible={}", state.boards.len());
    }

    let detail = BoardDetailScreen::new(boards.clone(), board.id.clone(), &settings);
    let mut detail_states = detail.states();
    for (title, price) in [("Milk", 3.5), ("Bread", 4.0), ("Coffee", 6.0)] {
        let task = detail.add_task(title).await?;
        detail.update_task_price(&task.id, price).await?;
    }
    detail.set_sort(TaskSortOption::AlphaAsc);
    let loaded = drain(&mut detail_states);
    let tasks = loaded
        .as_ref()
        .map(|state| state.tasks.clone())
        .unwrap_or_default();
    report(loaded);

    let mut celebrated = false;
    for task in &tasks {
        detail.toggle_task(task).await?;
        while let Some(Some(state)) = detail_states.next().now_or_never() {
            celebrated |= state.show_celebration;
            report(Some(state));
        }
    }
    println!("celebrated={celebrated}");

    let removed = boards.delete_board(&board.id).await?;
    info!(
        "event=demo_finish module=cli status=ok tasks_removed={}",
        removed
    );
    println!("deleted board tasks_removed={removed}");
    Ok(())
}

/// Returns the newest state already queued on `states`.
fn drain<T>(states: &mut BoxStream<'static, T>) -> Option<T> {
    let mut latest = None;
    while let Some(Some(state)) = states.next().now_or_never() {
        latest = Some(state);
    }
    latest
}

fn report(state: Option<BoardDetailState>) {
    let Some(state) = state else {
        return;
    };
    println!(
        "board tasks={}/{} progress={:.2} total_cost={:.2}",
        state.completed_tasks(),
        state.total_tasks(),
        state.progress(),
        state.total_cost()
    );
}
