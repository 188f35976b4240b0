use crate::domain::{DvrError, DvrResult};
use globset::{Glob, GlobMatcher};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

/// Batch logs written by Slurm into the unit directory.
pub const JOB_LOG_PATTERN: &str = "slurm*.out";

const FORTRAN_RUNTIME_SIGNATURE: &str = "forrtl:";
const SEGMENTATION_FAULT: &str = "segmentation fault";

/// What the latest batch log says about a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureDiagnosis {
    Clean,
    NoJobOutput,
    Failed(String),
}

impl FailureDiagnosis {
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl Display for FailureDiagnosis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => f.write_str("ok"),
            Self::NoJobOutput => f.write_str("no job output"),
            Self::Failed(message) => f.write_str(message),
        }
    }
}

fn job_log_matcher() -> DvrResult<GlobMatcher> {
    Glob::new(JOB_LOG_PATTERN)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| {
            DvrError::internal(
                "SYS.JOB_LOG_PATTERN",
                format!("invalid job log pattern '{}': {}", JOB_LOG_PATTERN, source),
            )
        })
}

/// The lexicographically last `slurm*.out` in `directory`, i.e. the most recent job id.
pub fn latest_job_log(directory: &Path) -> DvrResult<Option<PathBuf>> {
    let Ok(entries) = fs::read_dir(directory) else {
        return Ok(None);
    };
    let matcher = job_log_matcher()?;
    let mut latest: Option<String> = None;
    for entry in entries {
        let entry = entry.map_err(|source| {
            DvrError::io_system(
                "IO.READ_DIRECTORY",
                format!("failed to list '{}': {}", directory.display(), source),
            )
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !matcher.is_match(&name) {
            continue;
        }
        if latest.as_deref().is_none_or(|current| name.as_str() > current) {
            latest = Some(name);
        }
    }
    Ok(latest.map(|name| directory.join(name)))
}

/// Scans the latest batch log for a Fortran runtime error or a segmentation fault.
pub fn detect_failure(directory: &Path) -> DvrResult<FailureDiagnosis> {
    let Some(log) = latest_job_log(directory)? else {
        return Ok(FailureDiagnosis::NoJobOutput);
    };
    let bytes = fs::read(&log).map_err(|source| {
        DvrError::io_system(
            "IO.READ_ARTIFACT",
            format!("failed to read '{}': {}", log.display(), source),
        )
    })?;
    Ok(diagnose_log(&String::from_utf8_lossy(&bytes)))
}

pub fn diagnose_log(text: &str) -> FailureDiagnosis {
    let runtime_error = text.lines().find_map(|line| {
        line.split_once(FORTRAN_RUNTIME_SIGNATURE)
            .map(|(_, message)| message.trim())
            .filter(|message| !message.is_empty())
    });
    if let Some(message) = runtime_error {
        return FailureDiagnosis::Failed(message.to_string());
    }
    if text.to_lowercase().contains(SEGMENTATION_FAULT) {
        return FailureDiagnosis::Failed(SEGMENTATION_FAULT.to_string());
    }
    FailureDiagnosis::Clean
}
