pub mod errors;

pub use errors::{
    CodecResult, DvrError, DvrErrorCategory, DvrResult, ExitPlaceholder, PipelineResult,
};

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const LABEL_DONE: &str = "===DONE===";
pub const LABEL_RUNNING: &str = "===RUNNING===";

/// Wavefunction record written by DVR3DRJZ for the J=0 and J=1 (k=0) blocks.
pub const FORT_26: &str = "fort.26";
/// Wavefunction records written by the restricted-basis step.
pub const FORT_8: &str = "fort.8";
pub const FORT_9: &str = "fort.9";

const RECORDS_FORT_26: [&str; 1] = [FORT_26];
const RECORDS_FORT_8: [&str; 1] = [FORT_8];
const RECORDS_FORT_8_9: [&str; 2] = [FORT_8, FORT_9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectKind {
    Positions,
    Intensities,
}

impl ProjectKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positions => "positions",
            Self::Intensities => "intensities",
        }
    }
}

impl Display for ProjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// External programs of the DVR3D suite driven by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    Dvr3drjz,
    Rotlev3,
    Rotlev3b,
    Rotlev3z,
    Dipole3b,
    Spectra,
}

impl SolverKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dvr3drjz => "DVR3DRJZ",
            Self::Rotlev3 => "ROTLEV3",
            Self::Rotlev3b => "ROTLEV3B",
            Self::Rotlev3z => "ROTLEV3Z",
            Self::Dipole3b => "DIPOLE3B",
            Self::Spectra => "SPECTRA",
        }
    }

    /// Lowercase stem used for the starter, input and output file names.
    pub const fn stem(self) -> &'static str {
        match self {
            Self::Dvr3drjz => "dvr3drjz",
            Self::Rotlev3 => "rotlev3",
            Self::Rotlev3b => "rotlev3b",
            Self::Rotlev3z => "rotlev3z",
            Self::Dipole3b => "dipole3b",
            Self::Spectra => "spectra",
        }
    }

    pub fn starter_file(self) -> String {
        format!("{}.sh", self.stem())
    }

    pub fn input_file(self) -> String {
        format!("{}.inp", self.stem())
    }

    pub fn output_file(self) -> String {
        format!("{}.out", self.stem())
    }
}

impl Display for SolverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// One rotational block: a working directory and the (J, k, p) it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateLabel {
    pub name: String,
    pub jrot: u32,
    pub kmin: u8,
    pub ipar: u8,
}

impl StateLabel {
    pub fn new(name: impl Into<String>, jrot: u32, kmin: u8, ipar: u8) -> DvrResult<Self> {
        let name = name.into();
        if kmin > 2 {
            return Err(DvrError::lookup(
                "LOOKUP.QUANTUM_LABEL",
                format!("state '{}' has kmin={} outside {{0,1,2}}", name, kmin),
            ));
        }
        if ipar > 1 {
            return Err(DvrError::lookup(
                "LOOKUP.QUANTUM_LABEL",
                format!("state '{}' has ipar={} outside {{0,1}}", name, ipar),
            ));
        }
        Ok(Self {
            name,
            jrot,
            kmin,
            ipar,
        })
    }

    pub const fn jki(&self) -> (u32, u8, u8) {
        (self.jrot, self.kmin, self.ipar)
    }

    /// Vibrational blocks whose energies file starts with the zero-point energy and
    /// whose energies are already measured from it.
    pub const fn is_reference(&self) -> bool {
        self.jrot == 0 && self.ipar == 0
    }

    pub fn wavefunction_records(&self) -> DvrResult<&'static [&'static str]> {
        wavefunction_records(self.jrot, self.kmin)
    }

    /// Large scratch files left behind by a finished block.
    pub fn scratch_files(&self) -> Vec<&'static str> {
        let mut files = vec!["fort.16"];
        if (self.jrot == 1 && self.kmin == 1) || self.jrot > 1 {
            files.push(FORT_26);
        }
        files
    }

    pub fn directory(&self, root: &Path) -> PathBuf {
        root.join(&self.name)
    }
}

impl Display for StateLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (J={}, kmin={}, ipar={})",
            self.name, self.jrot, self.kmin, self.ipar
        )
    }
}

/// Files holding the wavefunctions of a (J, kmin) block.
pub fn wavefunction_records(jrot: u32, kmin: u8) -> DvrResult<&'static [&'static str]> {
    match (jrot, kmin) {
        (0, 0..=2) => Ok(&RECORDS_FORT_26),
        (1, 0) => Ok(&RECORDS_FORT_26),
        (1, 1) => Ok(&RECORDS_FORT_8),
        (j, 0 | 1) if j > 1 => Ok(&RECORDS_FORT_8),
        (j, 2) if j >= 1 => Ok(&RECORDS_FORT_8_9),
        _ => Err(DvrError::lookup(
            "LOOKUP.WAVEFUNCTION_RECORDS",
            format!("unknown combination of jrot and kmin: {} {}", jrot, kmin),
        )),
    }
}

/// A bra/ket pair of rotational blocks with the wavefunction record chosen on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionLabel {
    pub id: String,
    pub bra: StateLabel,
    pub ket: StateLabel,
    pub fort_bra: String,
    pub fort_ket: String,
}

impl TransitionLabel {
    pub fn folder_name(&self) -> String {
        transition_folder_name(&self.bra.name, &self.fort_bra, &self.ket.name, &self.fort_ket)
    }
}

pub fn transition_folder_name(bra: &str, fort_bra: &str, ket: &str, fort_ket: &str) -> String {
    format!(
        "{}_{}__{}_{}",
        bra,
        pad_record_name(fort_bra),
        ket,
        pad_record_name(fort_ket)
    )
}

fn pad_record_name(fort: &str) -> String {
    format!("{fort:>7}").replace(' ', "_")
}
