//! Rotational assignments written by the Hose-Taylor program next to each
//! wavefunction record: `<record>.hose-taylor.out`, one level per line as
//! `J energy Ka Kc max|<psi|psi>|^2 ipar kmin mod(v3,2)`.

use crate::codec::parse_required_float;
use crate::domain::{DvrResult, StateLabel};
use crate::serialization::{read_text_artifact, write_csv_artifact, write_text_artifact};
use serde::Serialize;
use std::path::Path;

pub const ASSIGNMENTS_SUFFIX: &str = ".hose-taylor.out";
pub const ASSIGNMENTS_CSV: &str = "states_ht.csv";
pub const ASSIGNMENTS_STAT: &str = "states_ht.stat";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentRow {
    pub jrot: i64,
    pub energy: f64,
    pub ka: i64,
    pub kc: i64,
    pub maxpsi2: f64,
    pub kmin: i64,
    pub ipar: i64,
    pub nu3odd: i64,
    pub wfnfile: String,
    pub dir: String,
}

pub fn assignment_file(record: &str) -> String {
    format!("{}{}", record, ASSIGNMENTS_SUFFIX)
}

pub fn parse_assignment_table(text: &str, record: &str, dir: &str) -> Vec<AssignmentRow> {
    text.lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let [jrot, energy, ka, kc, maxpsi2, ipar, kmin, nu3odd] = tokens.as_slice() else {
                return None;
            };
            Some(AssignmentRow {
                jrot: jrot.parse().ok()?,
                energy: parse_required_float(energy, "ENERGY").ok()?,
                ka: ka.parse().ok()?,
                kc: kc.parse().ok()?,
                maxpsi2: parse_required_float(maxpsi2, "MAXPSI2").ok()?,
                kmin: kmin.parse().ok()?,
                ipar: ipar.parse().ok()?,
                nu3odd: nu3odd.parse().ok()?,
                wfnfile: record.to_string(),
                dir: dir.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentCollection {
    pub rows: Vec<AssignmentRow>,
    pub blocks: Vec<(StateLabel, usize)>,
}

/// Reads the assignment tables of every wavefunction record of `states`.
pub fn collect_assignments(root: &Path, states: &[StateLabel]) -> DvrResult<AssignmentCollection> {
    let mut collection = AssignmentCollection::default();
    for state in states {
        tracing::info!(unit = %state.name, "collecting rotational assignments");
        let directory = state.directory(root);
        let mut count = 0;
        for record in state.wavefunction_records()? {
            let path = directory.join(assignment_file(record));
            if !path.is_file() {
                tracing::warn!(path = %path.display(), "assignment table is missing");
                continue;
            }
            let rows = parse_assignment_table(&read_text_artifact(&path)?, record, &state.name);
            count += rows.len();
            collection.rows.extend(rows);
        }
        collection.blocks.push((state.clone(), count));
    }
    Ok(collection)
}

impl AssignmentCollection {
    pub fn render_statistics(&self) -> String {
        let mut text = format!(
            "{:>12}{:>6}{:>6}{:>6}{:>8}\n",
            "name", "jrot", "kmin", "ipar", "N"
        );
        for (state, count) in &self.blocks {
            text.push_str(&format!(
                "{:>12}{:>6}{:>6}{:>6}{:>8}\n",
                state.name, state.jrot, state.kmin, state.ipar, count
            ));
        }
        text
    }

    /// Writes `states_ht.csv` and `states_ht.stat` into `root`.
    pub fn write_to(&self, root: &Path) -> DvrResult<()> {
        write_csv_artifact(&root.join(ASSIGNMENTS_CSV), &self.rows)?;
        write_text_artifact(&root.join(ASSIGNMENTS_STAT), &self.render_statistics())
    }
}

#[cfg(test)]
mod tests {
    use super::{collect_assignments, parse_assignment_table};
    use crate::domain::StateLabel;
    use std::fs;
    use tempfile::TempDir;

    const FORT_8_TABLE: &str = " 1       3.98439   1  0   1.00000  1  0  0\n\
        \x201     704.71567   1  0   1.00000  1  0  0\n\
        \n";

    #[test]
    fn rows_carry_the_record_they_came_from() {
        let rows = parse_assignment_table(FORT_8_TABLE, "fort.8", "jki_0110f");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].energy, 704.71567);
        assert_eq!((rows[1].ka, rows[1].kc), (1, 0));
        assert_eq!(rows[1].wfnfile, "fort.8");
    }

    #[test]
    fn both_records_of_k2_blocks_are_read() {
        let temp = TempDir::new().expect("tempdir should be created");
        let directory = temp.path().join("jki_0221f");
        fs::create_dir_all(&directory).expect("unit should be created");
        fs::write(directory.join("fort.8.hose-taylor.out"), FORT_8_TABLE).expect("table");
        fs::write(
            directory.join("fort.9.hose-taylor.out"),
            " 2     710.00000   2  1   0.98000  1  2  1\n",
        )
        .expect("table");
        let state = StateLabel::new("jki_0221f", 2, 2, 1).expect("label");

        let collection = collect_assignments(temp.path(), &[state]).expect("collect");
        assert_eq!(collection.rows.len(), 3);
        assert_eq!(collection.rows[2].wfnfile, "fort.9");
        assert_eq!(collection.blocks[0].1, 3);
        collection.write_to(temp.path()).expect("outputs should be written");
        assert!(temp.path().join("states_ht.csv").is_file());
    }
}
