//! DIPOLE3B input: transition dipoles between a bra and a ket block.
//!
//! ```text
//! 1  &PRT ... &END
//! 2  dipole surface parameter file
//! 3  title
//! 4  NPOT [NV1 NV2 IBASE1 IBASE2]     5I5
//! 5  EZERO
//! ```

use super::DefaultsProfile;
use super::traits::InputRecord;
use crate::codec::{
    FieldWidths, Namelist, NamelistLine, RecordReader, decode_namelist_line, format_int_fields,
    format_reference_energy, parse_optional_float, parse_optional_int, parse_required_int,
    slice_fixed_width,
};
use crate::domain::{CodecResult, SolverKind};

const CONTROL_KEYS: [&str; 5] = ["NPOT", "NV1", "NV2", "IBASE1", "IBASE2"];

/// Optional control keys are compacted on write and read back by column: leaving `nv2`
/// unset while `ibase1` is set makes `ibase1` come back as `nv2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dipole3bInput {
    pub prt: NamelistLine,
    pub parfile: String,
    pub title: String,
    /// Gauss-Legendre quadrature points.
    pub npot: i64,
    /// Ket and bra eigenfunctions considered.
    pub nv1: Option<i64>,
    pub nv2: Option<i64>,
    /// Lowest ket and bra eigenfunctions skipped.
    pub ibase1: Option<i64>,
    pub ibase2: Option<i64>,
    pub ezero: f64,
}

impl Dipole3bInput {
    pub fn defaults(profile: DefaultsProfile) -> Self {
        let (npot, nv) = match profile {
            DefaultsProfile::Lite => (10, Some(20)),
            DefaultsProfile::Heavy => (20, None),
        };
        Self {
            prt: NamelistLine::single(
                Namelist::new("PRT")
                    .with("zstart", true)
                    .with("zprint", true),
            ),
            parfile: "dms_surface2_q_rrt_666.par".to_string(),
            title: "DVR DIPOLE CALC".to_string(),
            npot,
            nv1: nv,
            nv2: nv,
            ibase1: None,
            ibase2: None,
            ezero: 0.0,
        }
    }

    pub fn control_keys(&self) -> Vec<i64> {
        let mut keys = vec![self.npot];
        keys.extend(
            [self.nv1, self.nv2, self.ibase1, self.ibase2]
                .into_iter()
                .flatten(),
        );
        keys
    }

    pub fn parse(source: &str) -> CodecResult<Self> {
        let mut reader = RecordReader::new("DIPOLE3B", source);
        let prt = decode_namelist_line(reader.next_line("PRT namelist")?)?;
        let parfile = reader.next_line("parameter file")?.trim().to_string();
        let title = reader.next_line("title")?.trim_end().to_string();
        let fields = slice_fixed_width(
            reader.next_line("control keys")?,
            FieldWidths::Explicit(&[5; 5]),
        );
        let npot = parse_required_int(fields[0], CONTROL_KEYS[0])?;
        let optional = |index: usize| parse_optional_int(fields[index], CONTROL_KEYS[index]);
        let (nv1, nv2, ibase1, ibase2) = (optional(1)?, optional(2)?, optional(3)?, optional(4)?);
        let ezero = parse_optional_float(reader.next_line_or_empty(), "EZERO")?.unwrap_or(0.0);

        Ok(Self {
            prt,
            parfile,
            title,
            npot,
            nv1,
            nv2,
            ibase1,
            ibase2,
            ezero,
        })
    }
}

impl InputRecord for Dipole3bInput {
    fn kind(&self) -> SolverKind {
        SolverKind::Dipole3b
    }

    fn render(&self) -> String {
        [
            self.prt.render(),
            self.parfile.clone(),
            self.title.trim_end().to_string(),
            format_int_fields(&self.control_keys(), 5),
            format_reference_energy(self.ezero),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::Dipole3bInput;
    use crate::domain::DvrErrorCategory;
    use crate::programs::{DefaultsProfile, InputRecord};

    #[test]
    fn profiles_disagree_on_basis_truncation() {
        let lite = Dipole3bInput::defaults(DefaultsProfile::Lite).render();
        let heavy = Dipole3bInput::defaults(DefaultsProfile::Heavy).render();
        assert_eq!(
            lite,
            "&PRT zstart=.true., zprint=.true. &END\ndms_surface2_q_rrt_666.par\n\
             DVR DIPOLE CALC\n   10   20   20\n0.00000000000"
        );
        assert_eq!(heavy.lines().nth(3), Some("   20"));
    }

    #[test]
    fn parse_inverts_render() {
        let mut input = Dipole3bInput::defaults(DefaultsProfile::Lite);
        input.parfile = "../dms.par".to_string();
        input.ibase1 = Some(1);
        input.ibase2 = Some(2);
        input.ezero = 1443.586;
        let parsed = Dipole3bInput::parse(&input.render()).expect("record should parse");
        assert_eq!(parsed, input);
    }

    #[test]
    fn compacted_keys_shift_into_earlier_slots() {
        let mut input = Dipole3bInput::defaults(DefaultsProfile::Heavy);
        input.nv1 = Some(30);
        input.ibase1 = Some(2);
        let rendered = input.render();
        assert_eq!(rendered.lines().nth(3), Some("   20   30    2"));
        let parsed = Dipole3bInput::parse(&rendered).expect("record should parse");
        assert_eq!((parsed.nv1, parsed.nv2, parsed.ibase1), (Some(30), Some(2), None));
        assert_eq!(parsed.control_keys(), input.control_keys());
    }

    #[test]
    fn blank_npot_is_rejected() {
        let source = "&PRT zstart=.true. &END\ndms.par\nTITLE\n        20   20\n0.0";
        let error = Dipole3bInput::parse(source).expect_err("NPOT is required");
        assert_eq!(error.category(), DvrErrorCategory::ParseError);
        assert!(error.message().contains("NPOT"));
    }
}
