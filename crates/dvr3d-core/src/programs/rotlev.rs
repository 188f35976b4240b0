//! ROTLEV3 / ROTLEV3B / ROTLEV3Z input: the restricted-basis rotational step.
//!
//! ```text
//! 1  &PRT ... &END
//! 2  NVIB NEVAL KMIN [IBASS NEVAL2 NPNT]     6I5
//! 3  title
//! 4  EZERO
//! ```

use super::dvr3drjz::Dvr3drjzInput;
use super::traits::InputRecord;
use crate::codec::{
    FieldWidths, Namelist, NamelistLine, RecordReader, decode_namelist_line, format_int_fields,
    format_reference_energy, parse_optional_float, parse_optional_int, parse_required_int,
    slice_fixed_width,
};
use crate::domain::{CodecResult, DvrError, SolverKind};

const CONTROL_KEYS: [&str; 6] = ["NVIB", "NEVAL", "KMIN", "IBASS", "NEVAL2", "NPNT"];

/// The optional control keys are written without gaps and read back by column, so an
/// optional key set after an absent one reads back in the earlier slot: `neval2` without
/// `ibass` parses as `ibass`.
#[derive(Debug, Clone, PartialEq)]
pub struct RotlevInput {
    pub variant: SolverKind,
    pub prt: NamelistLine,
    pub nvib: i64,
    pub neval: i64,
    pub kmin: i64,
    pub ibass: Option<i64>,
    pub neval2: Option<i64>,
    pub npnt: Option<i64>,
    pub title: String,
    pub ezero: f64,
}

impl RotlevInput {
    /// Defaults for the rotational step that follows `dvr`; KMIN and EZERO are taken from it.
    pub fn following(variant: SolverKind, dvr: &Dvr3drjzInput) -> CodecResult<Self> {
        ensure_rotlev(variant)?;
        Ok(Self {
            variant,
            prt: NamelistLine::single(
                Namelist::new("PRT")
                    .with("zdcore", true)
                    .with("ztran", true)
                    .with("meout", false),
            ),
            nvib: 9999,
            neval: 9999,
            kmin: dvr.kmin,
            ibass: None,
            neval2: None,
            npnt: None,
            title: "ROTLEV POSITIONS CALC".to_string(),
            ezero: dvr.ezero,
        })
    }

    /// Mandatory keys followed by whichever optional keys are set, without gaps.
    pub fn control_keys(&self) -> Vec<i64> {
        let mut keys = vec![self.nvib, self.neval, self.kmin];
        keys.extend([self.ibass, self.neval2, self.npnt].into_iter().flatten());
        keys
    }

    pub fn parse(variant: SolverKind, source: &str) -> CodecResult<Self> {
        ensure_rotlev(variant)?;
        let mut reader = RecordReader::new(variant.as_str(), source);
        let prt = decode_namelist_line(reader.next_line("PRT namelist")?)?;
        let fields = slice_fixed_width(
            reader.next_line("control keys")?,
            FieldWidths::Explicit(&[5; 6]),
        );
        let nvib = parse_required_int(fields[0], CONTROL_KEYS[0])?;
        let neval = parse_required_int(fields[1], CONTROL_KEYS[1])?;
        let kmin = parse_required_int(fields[2], CONTROL_KEYS[2])?;
        let ibass = parse_optional_int(fields[3], CONTROL_KEYS[3])?;
        let neval2 = parse_optional_int(fields[4], CONTROL_KEYS[4])?;
        let npnt = parse_optional_int(fields[5], CONTROL_KEYS[5])?;
        let title = reader.next_line("title")?.trim_end().to_string();
        let ezero = parse_optional_float(reader.next_line_or_empty(), "EZERO")?.unwrap_or(0.0);

        Ok(Self {
            variant,
            prt,
            nvib,
            neval,
            kmin,
            ibass,
            neval2,
            npnt,
            title,
            ezero,
        })
    }
}

impl InputRecord for RotlevInput {
    fn kind(&self) -> SolverKind {
        self.variant
    }

    fn render(&self) -> String {
        [
            self.prt.render(),
            format_int_fields(&self.control_keys(), 5),
            self.title.trim_end().to_string(),
            format_reference_energy(self.ezero),
        ]
        .join("\n")
    }
}

fn ensure_rotlev(variant: SolverKind) -> CodecResult<()> {
    match variant {
        SolverKind::Rotlev3 | SolverKind::Rotlev3b | SolverKind::Rotlev3z => Ok(()),
        other => Err(DvrError::internal(
            "INTERNAL.ROTLEV_VARIANT",
            format!("{} is not a restricted-basis solver", other),
        )),
    }
}
