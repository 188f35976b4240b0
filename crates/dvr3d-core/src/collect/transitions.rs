//! DIPOLE3B transition moments and SPECTRA line lists of the transition folders.

use crate::codec::parse_required_float;
use crate::domain::{DvrResult, TransitionLabel};
use crate::serialization::{read_text_artifact, write_csv_artifact, write_text_artifact};
use serde::Serialize;
use std::path::Path;

pub const DIPOLE3B_CSV: &str = "dipole3b.csv";
pub const SPECTRA_CSV: &str = "spectra.csv";
pub const TRANSITIONS_STAT: &str = "transitions.stat";

const DIPOLE3B_OUTPUT: &str = "dipole3b.out";
const SPECTRA_OUTPUT: &str = "spectra.out";

const DIPOLE3B_HEADER: [&str; 7] = ["ie1", "ie2", "ket", "energy", "bra", "energy", "frequency"];
const SPECTRA_HEADER: [&str; 7] = ["ipar", "j2", "p2", "i2", "j1", "p1", "i1"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DipoleRow {
    pub ie1: i64,
    pub ie2: i64,
    pub ket_energy: f64,
    pub bra_energy: f64,
    pub frequency: f64,
    pub z_transition: f64,
    pub x_transition: f64,
    pub dipole: f64,
    pub s_fi: f64,
    pub a_coefficient: f64,
    pub job_id: String,
    pub dir: String,
}

/// One SPECTRA line; `2` is the upper and `1` the lower level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectraRow {
    pub frequency: f64,
    pub intensity: f64,
    pub e_lower: f64,
    pub ipar: i64,
    #[serde(rename = "j")]
    pub j2: i64,
    #[serde(rename = "p")]
    pub p2: i64,
    #[serde(rename = "i")]
    pub i2: i64,
    #[serde(rename = "j_")]
    pub j1: i64,
    #[serde(rename = "p_")]
    pub p1: i64,
    #[serde(rename = "i_")]
    pub i1: i64,
    pub job_id: String,
    pub dir: String,
}

fn float(token: &str) -> Option<f64> {
    parse_required_float(token, "value").ok()
}

fn int(token: &str) -> Option<i64> {
    token.parse().ok()
}

/// Lines following the first one whose leading tokens are `header`.
fn rows_after_header<'t>(text: &'t str, header: &[&str]) -> impl Iterator<Item = Vec<&'t str>> {
    let mut lines = text.lines();
    let found = lines
        .by_ref()
        .any(|line| line.split_whitespace().take(header.len()).eq(header.iter().copied()));
    lines
        .filter(move |_| found)
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
}

pub fn parse_dipole3b_table(text: &str, job_id: &str, dir: &str) -> Vec<DipoleRow> {
    rows_after_header(text, &DIPOLE3B_HEADER)
        .filter_map(|tokens| {
            if tokens.len() < 10 {
                return None;
            }
            Some(DipoleRow {
                ie1: int(tokens[0])?,
                ie2: int(tokens[1])?,
                ket_energy: float(tokens[2])?,
                bra_energy: float(tokens[3])?,
                frequency: float(tokens[4])?,
                z_transition: float(tokens[5])?,
                x_transition: float(tokens[6])?,
                dipole: float(tokens[7])?,
                s_fi: float(tokens[8])?,
                a_coefficient: float(tokens[9])?,
                job_id: job_id.to_string(),
                dir: dir.to_string(),
            })
        })
        .collect()
}

pub fn parse_spectra_table(text: &str, job_id: &str, dir: &str) -> Vec<SpectraRow> {
    rows_after_header(text, &SPECTRA_HEADER)
        .filter_map(|tokens| {
            if tokens.len() < 12 {
                return None;
            }
            Some(SpectraRow {
                frequency: float(tokens[9])?,
                intensity: float(tokens[11])?,
                e_lower: float(tokens[8])?,
                ipar: int(tokens[0])?,
                j2: int(tokens[1])?,
                p2: int(tokens[2])?,
                i2: int(tokens[3])?,
                j1: int(tokens[4])?,
                p1: int(tokens[5])?,
                i1: int(tokens[6])?,
                job_id: job_id.to_string(),
                dir: dir.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionStatistics {
    pub id: String,
    pub folder: String,
    pub dipole_count: usize,
    pub spectra_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionsCollection {
    pub dipole: Vec<DipoleRow>,
    pub spectra: Vec<SpectraRow>,
    pub blocks: Vec<TransitionStatistics>,
}

fn read_optional(path: &Path) -> DvrResult<Option<String>> {
    if !path.is_file() {
        tracing::warn!(path = %path.display(), "output file is missing");
        return Ok(None);
    }
    read_text_artifact(path).map(Some)
}

/// Reads DIPOLE3B and SPECTRA outputs of every transition folder below `root`.
pub fn collect_transitions(
    root: &Path,
    transitions: &[TransitionLabel],
) -> DvrResult<TransitionsCollection> {
    let mut collection = TransitionsCollection::default();
    for transition in transitions {
        let folder = transition.folder_name();
        tracing::info!(unit = %folder, id = %transition.id, "collecting transitions");
        let directory = root.join(&folder);

        let dipole = read_optional(&directory.join(DIPOLE3B_OUTPUT))?
            .map(|text| parse_dipole3b_table(&text, &transition.id, &folder))
            .unwrap_or_default();
        let spectra = read_optional(&directory.join(SPECTRA_OUTPUT))?
            .map(|text| parse_spectra_table(&text, &transition.id, &folder))
            .unwrap_or_default();

        collection.blocks.push(TransitionStatistics {
            id: transition.id.clone(),
            folder,
            dipole_count: dipole.len(),
            spectra_count: spectra.len(),
        });
        collection.dipole.extend(dipole);
        collection.spectra.extend(spectra);
    }
    Ok(collection)
}

impl TransitionsCollection {
    pub fn render_statistics(&self) -> String {
        let mut text = format!("{:>10}  {:>34}{:>8}{:>8}\n", "id", "name", "N_dip", "N_spe");
        for block in &self.blocks {
            text.push_str(&format!(
                "{:>10}  {:>34}{:>8}{:>8}\n",
                block.id, block.folder, block.dipole_count, block.spectra_count
            ));
        }
        text
    }

    /// Writes `dipole3b.csv`, `spectra.csv` and `transitions.stat` into `root`.
    pub fn write_to(&self, root: &Path) -> DvrResult<()> {
        write_csv_artifact(&root.join(DIPOLE3B_CSV), &self.dipole)?;
        write_csv_artifact(&root.join(SPECTRA_CSV), &self.spectra)?;
        write_text_artifact(&root.join(TRANSITIONS_STAT), &self.render_statistics())
    }
}

#[cfg(test)]
mod tests {
    use super::{collect_transitions, parse_dipole3b_table, parse_spectra_table};
    use crate::domain::{StateLabel, TransitionLabel};
    use std::fs;
    use tempfile::TempDir;

    const DIPOLE3B_OUT: &str = "\n DIPOLE3B run\n\n\
        \x20ie1 ie2   ket energy   bra energy    frequency  z transition    x transition       dipole       s(f-i)      a-coefficient\n\
        \n\
        \x20  1   1     1515.185     1504.092      -11.093   0.576154E-05  -0.317053E-02   0.316477E-02   0.100158E-04   0.857636E-09\n\
        \x20  1   2     1515.185     1520.009        4.824  -0.357373E-05   0.169575E-01   0.169540E-01   0.287437E-03   0.144549E-08\n\
        \x20selection rules violated\n";

    const SPECTRA_OUT: &str = "\
        ipar    j2    p2  i2    j1    p1  i1    e2           e1                freq         s(f-i)          abs i(w)       rel i(w)        a(if)\n\
        \n\
        \x20 1      1    0   96     0    0   58   6066.195206   6065.985090      0.210116   0.54605583E-01   0.219825E-39   0.217120E-21   0.529535E-10\n\
        \x20 1      0    0   35     1    0   56   4923.182350   4922.779175      0.403175   0.32218272E+00   0.123620E-35   0.122099E-17   0.662194E-08\n\
        \x20** NO DATA RECEIVED FROM DIPOLE **\n";

    #[test]
    fn dipole_rows_follow_the_header() {
        let rows = parse_dipole3b_table(DIPOLE3B_OUT, "spe1", "folder");
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].ie1, rows[0].ie2), (1, 1));
        assert_eq!(rows[1].frequency, 4.824);
        assert_eq!(rows[1].a_coefficient, 0.144549e-08);
        assert_eq!(rows[0].job_id, "spe1");
    }

    #[test]
    fn output_without_header_has_no_rows() {
        assert!(parse_dipole3b_table("j = 0 -> 0 not allowed: stop\n", "spe1", "f").is_empty());
        assert!(parse_spectra_table("** NO DATA RECEIVED FROM DIPOLE **\n", "spe1", "f").is_empty());
    }

    #[test]
    fn spectra_columns_map_to_line_fields() {
        let rows = parse_spectra_table(SPECTRA_OUT, "spe2", "folder");
        assert_eq!(rows.len(), 2);
        let line = &rows[1];
        assert_eq!(line.frequency, 0.403175);
        assert_eq!(line.intensity, 0.123620e-35);
        assert_eq!(line.e_lower, 4922.779175);
        assert_eq!(
            (line.ipar, line.j2, line.p2, line.i2, line.j1, line.p1, line.i1),
            (1, 0, 0, 35, 1, 0, 56)
        );
    }

    #[test]
    fn collected_transitions_are_exported() {
        let temp = TempDir::new().expect("tempdir should be created");
        let transition = TransitionLabel {
            id: "spe1".to_string(),
            bra: StateLabel::new("jki_0100f", 1, 0, 0).expect("label"),
            ket: StateLabel::new("jki_0000f", 0, 0, 0).expect("label"),
            fort_bra: "fort.26".to_string(),
            fort_ket: "fort.26".to_string(),
        };
        let folder = temp.path().join(transition.folder_name());
        fs::create_dir_all(&folder).expect("folder should be created");
        fs::write(folder.join("dipole3b.out"), DIPOLE3B_OUT).expect("output should be written");

        let collection = collect_transitions(temp.path(), &[transition]).expect("collect");
        assert_eq!(collection.dipole.len(), 2);
        assert!(collection.spectra.is_empty());
        collection.write_to(temp.path()).expect("outputs should be written");

        let csv = fs::read_to_string(temp.path().join("dipole3b.csv")).expect("csv exists");
        assert!(csv.starts_with(
            "ie1,ie2,ket_energy,bra_energy,frequency,z_transition,x_transition,dipole,s_fi,a_coefficient,job_id,dir\n"
        ));
        let stat = fs::read_to_string(temp.path().join("transitions.stat")).expect("stat exists");
        assert!(stat.contains("jki_0100f_fort.26__jki_0000f_fort.26       2       0"));
    }
}
