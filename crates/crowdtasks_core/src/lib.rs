//! Live collection synchronization and derived-state engine for CrowdTasks.
//!
//! Shared boards and their tasks live in a remote document store; this crate
//! turns store snapshots into screen states and user intents into writes
//! that keep each board's task count consistent.

pub mod error;
pub mod logging;
pub mod model;
pub mod screen;
pub mod service;
pub mod settings;
pub mod store;
pub mod sync;
pub mod view;

pub use error::{CoreError, CoreResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::board::{Board, BoardType};
pub use model::member::User;
pub use model::task::{Priority, Task};
pub use model::validation::ValidationError;
pub use screen::board_detail::BoardDetailScreen;
pub use screen::boards::BoardsScreen;
pub use screen::profile::ProfileScreen;
pub use service::board_service::{BoardService, TaskDetails};
pub use service::session::{Session, SharedSession};
pub use service::user_service::UserService;
pub use settings::{CoreSettings, SettingsError};
pub use store::document::DeleteOutcome;
pub use store::memory::InMemoryDocumentStore;
pub use store::source::{DocumentStore, StoreError, StoreResult};
pub use view::board_detail::{BoardDetailState, TaskAggregates};
pub use view::boards::BoardsState;
pub use view::profile::ProfileState;
pub use view::sort::{BoardSortOption, TaskSortOption};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
