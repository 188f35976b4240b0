//! Stage commands of the `positions` and `intensities` projects.
//!
//! Every path is composed from the project root; child processes get their
//! working directory explicitly.

mod intensities;
mod listing;
mod positions;

pub use intensities::{DIPOLE3B_JOB_SCRIPT, IntensitiesPipeline, SPECTRA_JOB_SCRIPT};
pub use listing::{
    extract_enumerated, parse_states, parse_transitions, read_states, read_transitions,
    render_states, render_transitions,
};
pub use positions::{
    CONFIG_FILE, CleanReport, PositionsPipeline, RovibModel, render_build_script, startproject,
};

use crate::collect::{FailureDiagnosis, detect_failure};
use crate::domain::{DvrError, DvrResult};
use crate::jobs::{JobSubmitter, WorkingDirectoryState};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Root directory of a project; relative config paths resolve against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Canonicalizes `root` so unit directories can be handed to child processes.
    pub fn open(root: &Path) -> DvrResult<Self> {
        let root = root.canonicalize().map_err(|source| {
            DvrError::io_system(
                "IO.PROJECT_ROOT",
                format!("cannot open project root '{}': {}", root.display(), source),
            )
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `relative` below the root; absolute paths are kept as given.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn unit(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Path of a project-root file as seen from inside a unit directory.
pub fn from_unit(path: &str) -> String {
    if Path::new(path).is_absolute() {
        path.to_string()
    } else {
        Path::new("..").join(path).display().to_string()
    }
}

/// State of one unit as reported by `check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitStatus {
    pub unit: String,
    pub state: WorkingDirectoryState,
    pub code: u8,
    pub diagnosis: FailureDiagnosis,
}

impl UnitStatus {
    pub fn inspect(layout: &ProjectLayout, unit: &str) -> DvrResult<Self> {
        let directory = layout.unit(unit);
        let state = WorkingDirectoryState::inspect(&directory);
        Ok(Self {
            unit: unit.to_string(),
            state,
            code: state.code(),
            diagnosis: detect_failure(&directory)?,
        })
    }

    pub fn describe(&self) -> String {
        let mut line = format!("status {}: {}", self.code, self.state.describe(&self.unit));
        if self.diagnosis.is_failure() {
            line.push_str(&format!(" (job log: {})", self.diagnosis));
        }
        line
    }
}

pub fn inspect_units<'n>(
    layout: &ProjectLayout,
    units: impl IntoIterator<Item = &'n str>,
) -> DvrResult<Vec<UnitStatus>> {
    let mut report = Vec::new();
    for unit in units {
        tracing::info!(unit, "checking unit");
        report.push(UnitStatus::inspect(layout, unit)?);
    }
    Ok(report)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub submitted: Vec<String>,
    pub skipped: Vec<(String, WorkingDirectoryState)>,
}

/// Submits `job_script` in every unit whose sentinels allow it.
pub fn submit_units<'n>(
    layout: &ProjectLayout,
    units: impl IntoIterator<Item = &'n str>,
    job_script: &str,
    submitter: &dyn JobSubmitter,
) -> DvrResult<SubmitReport> {
    let mut report = SubmitReport::default();
    for unit in units {
        let directory = layout.unit(unit);
        tracing::info!(unit, "submitting unit");
        if !directory.is_dir() {
            return Err(DvrError::io_system(
                "IO.UNIT_MISSING",
                format!("unit directory '{}' does not exist (run --create first)", directory.display()),
            ));
        }
        let state = WorkingDirectoryState::inspect(&directory);
        if !state.allows_submit() {
            tracing::warn!(unit, %state, "skipping submit");
            report.skipped.push((unit.to_string(), state));
            continue;
        }
        submitter.submit(&directory, job_script)?;
        report.submitted.push(unit.to_string());
    }
    Ok(report)
}

/// Append-only creation summary, flushed after every unit.
pub struct SummaryLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SummaryLog {
    pub fn create(path: &Path) -> DvrResult<Self> {
        let file = File::create(path).map_err(|source| {
            DvrError::io_system(
                "IO.WRITE_ARTIFACT",
                format!("failed to create '{}': {}", path.display(), source),
            )
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn record(&mut self, unit: &str, description: &str) -> DvrResult<()> {
        write!(self.writer, "\n\ndirname={}\n{}\n", unit, description)
            .and_then(|()| self.writer.flush())
            .map_err(|source| {
                DvrError::io_system(
                    "IO.WRITE_ARTIFACT",
                    format!("failed to write '{}': {}", self.path.display(), source),
                )
            })
    }
}
