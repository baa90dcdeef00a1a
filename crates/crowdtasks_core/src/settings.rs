//! User preferences that seed screen parameters.
//!
//! Settings are plain JSON with every field optional; missing fields take
//! their defaults and unknown fields are rejected so typos surface early.

use crate::logging::{normalize_level, LoggingError};
use crate::view::board_detail::BoardDetailParams;
use crate::view::boards::BoardsParams;
use crate::view::sort::{BoardSortOption, TaskSortOption};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreSettings {
    /// Show the "all done" celebration on board completion.
    pub show_celebration: bool,
    pub default_board_sort: BoardSortOption,
    pub default_task_sort: TaskSortOption,
    /// Overrides the build-mode default log level.
    pub log_level: Option<String>,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            show_celebration: true,
            default_board_sort: BoardSortOption::default(),
            default_task_sort: TaskSortOption::default(),
            log_level: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidLogLevel(#[from] LoggingError),
}

impl CoreSettings {
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw)?;
        if let Some(level) = settings.log_level.as_deref() {
            normalize_level(level)?;
        }
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Configured log level, falling back to the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or(crate::logging::default_log_level())
    }

    pub fn boards_params(&self) -> BoardsParams {
        BoardsParams {
            sort: self.default_board_sort,
            ..BoardsParams::default()
        }
    }

    pub fn board_detail_params(&self) -> BoardDetailParams {
        BoardDetailParams {
            sort: self.default_task_sort,
            celebrations_enabled: self.show_celebration,
            ..BoardDetailParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreSettings, SettingsError};
    use crate::view::sort::{BoardSortOption, TaskSortOption};
    use std::io::Write;

    #[test]
    fn empty_object_uses_defaults() {
        let settings = CoreSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, CoreSettings::default());
        assert!(settings.show_celebration);
        assert_eq!(settings.default_task_sort, TaskSortOption::Recent);
    }

    #[test]
    fn partial_settings_seed_screen_params() {
        let settings = CoreSettings::from_json_str(
            r#"{"show_celebration": false, "default_board_sort": "task_count_desc"}"#,
        )
        .unwrap();
        assert_eq!(settings.boards_params().sort, BoardSortOption::TaskCountDesc);
        let detail = settings.board_detail_params();
        assert!(!detail.celebrations_enabled);
        assert_eq!(detail.sort, TaskSortOption::Recent);
        assert_eq!(detail.armed_completion, None);
    }

    #[test]
    fn unknown_fields_and_bad_levels_are_rejected() {
        assert!(matches!(
            CoreSettings::from_json_str(r#"{"show_confetti": true}"#),
            Err(SettingsError::Parse(_))
        ));
        assert!(matches!(
            CoreSettings::from_json_str(r#"{"log_level": "loud"}"#),
            Err(SettingsError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_task_sort": "completed_first", "log_level": "warn"}}"#).unwrap();
        let settings = CoreSettings::load(file.path()).unwrap();
        assert_eq!(settings.default_task_sort, TaskSortOption::CompletedFirst);
        assert_eq!(settings.effective_log_level(), "warn");

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CoreSettings::load(&dir.path().join("missing.json")),
            Err(SettingsError::Io { .. })
        ));
    }
}
