use crate::domain::{LABEL_DONE, LABEL_RUNNING};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Job state of a unit directory, inferred from its sentinel files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingDirectoryState {
    Done,
    Running,
    NotStarted,
    /// Both sentinels are present; reported, never resolved automatically.
    Inconsistent,
}

impl WorkingDirectoryState {
    pub fn inspect(directory: &Path) -> Self {
        Self::from_sentinels(
            directory.join(LABEL_DONE).is_file(),
            directory.join(LABEL_RUNNING).is_file(),
        )
    }

    pub const fn from_sentinels(done: bool, running: bool) -> Self {
        match (done, running) {
            (true, false) => Self::Done,
            (false, true) => Self::Running,
            (false, false) => Self::NotStarted,
            (true, true) => Self::Inconsistent,
        }
    }

    /// Status code of the legacy reports: 0 done, 1 running, 2 not started, 3 inconsistent.
    pub const fn code(self) -> u8 {
        match self {
            Self::Done => 0,
            Self::Running => 1,
            Self::NotStarted => 2,
            Self::Inconsistent => 3,
        }
    }

    pub const fn allows_submit(self) -> bool {
        matches!(self, Self::Done | Self::NotStarted)
    }

    pub fn describe(self, unit: &str) -> String {
        match self {
            Self::Done => format!("job in {} is done", unit),
            Self::Running => format!("job in {} is still running", unit),
            Self::NotStarted => format!("job in {} has not been launched", unit),
            Self::Inconsistent => format!("job in {} has both sentinels (something is wrong)", unit),
        }
    }
}

impl Display for WorkingDirectoryState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Done => "DONE",
            Self::Running => "RUNNING",
            Self::NotStarted => "NOT STARTED",
            Self::Inconsistent => "INCONSISTENT",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::WorkingDirectoryState;
    use crate::domain::{LABEL_DONE, LABEL_RUNNING};
    use std::fs;
    use tempfile::TempDir;

    fn state_with(done: bool, running: bool) -> WorkingDirectoryState {
        let temp = TempDir::new().expect("tempdir should be created");
        if done {
            fs::write(temp.path().join(LABEL_DONE), "").expect("sentinel should be written");
        }
        if running {
            fs::write(temp.path().join(LABEL_RUNNING), "").expect("sentinel should be written");
        }
        WorkingDirectoryState::inspect(temp.path())
    }

    #[test]
    fn sentinel_combinations_map_to_four_states() {
        assert_eq!(state_with(true, false), WorkingDirectoryState::Done);
        assert_eq!(state_with(false, true), WorkingDirectoryState::Running);
        assert_eq!(state_with(false, false), WorkingDirectoryState::NotStarted);
        assert_eq!(state_with(true, true), WorkingDirectoryState::Inconsistent);
    }

    #[test]
    fn only_idle_units_may_be_submitted() {
        assert!(WorkingDirectoryState::Done.allows_submit());
        assert!(WorkingDirectoryState::NotStarted.allows_submit());
        assert!(!WorkingDirectoryState::Running.allows_submit());
        assert!(!WorkingDirectoryState::Inconsistent.allows_submit());
    }

    #[test]
    fn missing_directory_reads_as_not_started() {
        let temp = TempDir::new().expect("tempdir should be created");
        let state = WorkingDirectoryState::inspect(&temp.path().join("absent"));
        assert_eq!(state, WorkingDirectoryState::NotStarted);
        assert_eq!(state.code(), 2);
        assert_eq!(
            serde_json::to_string(&state).expect("state should serialize"),
            "\"not_started\""
        );
    }
}
