//! `energies.out` tables of the DVR3DRJZ and ROTLEV steps.
//!
//! Vibrational blocks with even parity start with the bare zero-point energy; every
//! other file starts with a `*` comment. A column header follows, then one
//! `n energy j parity symmetry` row per level.

use super::failure::{FailureDiagnosis, detect_failure};
use crate::domain::{DvrError, DvrResult, StateLabel};
use crate::serialization::{read_text_artifact, write_csv_artifact, write_text_artifact};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const ENERGIES_FILE: &str = "energies.out";
pub const STATES_CSV: &str = "states.csv";
pub const STATES_ZPE: &str = "states.ZPE";
pub const STATES_STAT: &str = "states.stat";

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub index: i64,
    pub energy: f64,
    pub jrot: i64,
    pub parity: i64,
    pub symmetry: i64,
    pub state: StateLabel,
    pub directory: PathBuf,
}

impl ResultRecord {
    fn parse(line: &str, state: &StateLabel, directory: &Path) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [index, energy, jrot, parity, symmetry] = tokens.as_slice() else {
            return None;
        };
        Some(Self {
            index: index.parse().ok()?,
            energy: energy.parse().ok()?,
            jrot: jrot.parse().ok()?,
            parity: parity.parse().ok()?,
            symmetry: symmetry.parse().ok()?,
            state: state.clone(),
            directory: directory.to_path_buf(),
        })
    }
}

/// Reads `<directory>/energies.out`; a missing file is `(None, [])`.
pub fn parse_result_table(
    directory: &Path,
    state: &StateLabel,
) -> DvrResult<(Option<f64>, Vec<ResultRecord>)> {
    let path = directory.join(ENERGIES_FILE);
    if !path.is_file() {
        return Ok((None, Vec::new()));
    }
    let text = read_text_artifact(&path)?;
    parse_result_text(&text, state, directory).map_err(|detail| {
        DvrError::parse(
            "PARSE.ENERGIES_BASELINE",
            format!("{}: {}", path.display(), detail),
        )
    })
}

fn parse_result_text(
    text: &str,
    state: &StateLabel,
    directory: &Path,
) -> Result<(Option<f64>, Vec<ResultRecord>), String> {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default();
    let baseline = if state.is_reference() {
        let token = first.trim();
        Some(
            token
                .parse::<f64>()
                .map_err(|_| format!("expected the zero-point energy, found '{}'", token))?,
        )
    } else {
        None
    };
    // column header
    lines.next();

    let mut records = Vec::new();
    for line in lines.filter(|line| !line.trim().is_empty()) {
        match ResultRecord::parse(line, state, directory) {
            Some(record) => records.push(record),
            None => tracing::debug!(line, "skipping unparsed energy row"),
        }
    }
    Ok((baseline, records))
}

/// Everything collected from one unit directory.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockResult {
    pub state: StateLabel,
    pub baseline: Option<f64>,
    pub records: Vec<ResultRecord>,
    pub diagnosis: FailureDiagnosis,
}

impl BlockResult {
    pub fn read(root: &Path, state: &StateLabel) -> DvrResult<Self> {
        let directory = state.directory(root);
        let (baseline, records) = parse_result_table(&directory, state)?;
        Ok(Self {
            state: state.clone(),
            baseline,
            records,
            diagnosis: detect_failure(&directory)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatistics {
    pub state: StateLabel,
    pub count: usize,
    pub diagnosis: FailureDiagnosis,
}

/// Energies of all blocks measured from the shared zero-point energy.
#[derive(Debug, Clone, PartialEq)]
pub struct StatesCollection {
    pub baseline: f64,
    pub records: Vec<ResultRecord>,
    pub blocks: Vec<BlockStatistics>,
}

/// Requires exactly one distinct baseline and subtracts it from every record outside the
/// reference blocks, whose energies are already relative to it.
pub fn aggregate_states(blocks: Vec<BlockResult>) -> DvrResult<StatesCollection> {
    let mut baselines: Vec<f64> = Vec::new();
    for baseline in blocks.iter().filter_map(|block| block.baseline) {
        if !baselines.contains(&baseline) {
            baselines.push(baseline);
        }
    }
    let baseline = match baselines.as_slice() {
        [single] => *single,
        [] => {
            return Err(DvrError::consistency(
                "CONSISTENCY.BASELINE",
                "no zero-point energy found: no reference block (J=0, ipar=0) has an energies table",
            ));
        }
        several => {
            let listed: Vec<String> = several.iter().map(ToString::to_string).collect();
            return Err(DvrError::consistency(
                "CONSISTENCY.BASELINE",
                format!("zero-point energies differ between blocks: {}", listed.join(", ")),
            ));
        }
    };

    let mut records = Vec::new();
    let mut statistics = Vec::with_capacity(blocks.len());
    for block in blocks {
        statistics.push(BlockStatistics {
            state: block.state.clone(),
            count: block.records.len(),
            diagnosis: block.diagnosis,
        });
        let shift = if block.state.is_reference() { 0.0 } else { baseline };
        records.extend(block.records.into_iter().map(|mut record| {
            record.energy -= shift;
            record
        }));
    }
    Ok(StatesCollection {
        baseline,
        records,
        blocks: statistics,
    })
}

/// Reads and aggregates the blocks of `states` below `root`.
pub fn collect_states(root: &Path, states: &[StateLabel]) -> DvrResult<StatesCollection> {
    let mut blocks = Vec::with_capacity(states.len());
    for state in states {
        tracing::info!(unit = %state.name, "collecting energies");
        let block = BlockResult::read(root, state)?;
        if block.records.is_empty() {
            tracing::warn!(unit = %state.name, diagnosis = %block.diagnosis, "no energies found");
        }
        blocks.push(block);
    }
    aggregate_states(blocks)
}

#[derive(Debug, Serialize)]
struct StateRow<'a> {
    n: i64,
    e: f64,
    j: i64,
    p: i64,
    s: i64,
    jrot: u32,
    kmin: u8,
    ipar: u8,
    dir: &'a str,
}

impl StatesCollection {
    pub fn unit_count(&self) -> usize {
        let mut names: Vec<&str> = self
            .records
            .iter()
            .map(|record| record.state.name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }

    pub fn render_statistics(&self) -> String {
        let mut text = format!(
            "{:>12}{:>6}{:>6}{:>6}{:>8}  {}\n",
            "name", "jrot", "kmin", "ipar", "N", "error_msg"
        );
        for block in &self.blocks {
            text.push_str(&format!(
                "{:>12}{:>6}{:>6}{:>6}{:>8}  {}\n",
                block.state.name,
                block.state.jrot,
                block.state.kmin,
                block.state.ipar,
                block.count,
                block.diagnosis
            ));
        }
        text
    }

    /// Writes `states.csv`, `states.ZPE` and `states.stat` into `root`.
    pub fn write_to(&self, root: &Path) -> DvrResult<()> {
        let rows: Vec<StateRow<'_>> = self
            .records
            .iter()
            .map(|record| StateRow {
                n: record.index,
                e: record.energy,
                j: record.jrot,
                p: record.parity,
                s: record.symmetry,
                jrot: record.state.jrot,
                kmin: record.state.kmin,
                ipar: record.state.ipar,
                dir: &record.state.name,
            })
            .collect();
        write_csv_artifact(&root.join(STATES_CSV), &rows)?;
        write_text_artifact(&root.join(STATES_ZPE), &format!("{:.8}", self.baseline))?;
        write_text_artifact(&root.join(STATES_STAT), &self.render_statistics())
    }
}

/// Reads the zero-point energy saved by a previous collect.
pub fn read_zero_point_energy(root: &Path) -> DvrResult<f64> {
    let path = root.join(STATES_ZPE);
    let text = read_text_artifact(&path)?;
    text.trim().parse().map_err(|_| {
        DvrError::parse(
            "PARSE.ZERO_POINT_ENERGY",
            format!("{}: expected a number, found '{}'", path.display(), text.trim()),
        )
    })
}
