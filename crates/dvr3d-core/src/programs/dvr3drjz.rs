//! DVR3DRJZ input: the contiguous-basis (vibrational and J, k block) solver.
//!
//! Line layout:
//!
//! ```text
//!  1  &PRT ... &END
//!  2  &VAR ... &END              (may carry further groups, e.g. &INT)
//!  3  parameter file or `dummy`
//!  4  NCOORD                                                   I5
//!  5  NPNT2 JROT NEVAL NALF MAX2D MAX3D IDIA KMIN NPNT1 IPAR [MAX3D2]   11I5
//!  6  title
//!  7  FIXCOS (blank when unset)                                F20.0
//!  8  XMASS(1..3)                                              3F20.0
//!  9  XMASSR(1..3)                                             3F20.0
//! 10  EMAX1 EMAX2                                              2F20.0
//! 11  RE1 DISS1 WE1                                            3F20.0
//! 12  RE2 DISS2 WE2                                            3F20.0
//! 13  EZERO
//! ```

use super::DefaultsProfile;
use super::traits::InputRecord;
use crate::codec::{
    FieldWidths, Namelist, NamelistLine, RecordReader, decode_namelist_line, format_fixed_fields,
    format_int_fields, format_reference_energy, parse_optional_float, parse_optional_int,
    parse_required_float, parse_required_int, slice_fixed_width,
};
use crate::domain::{CodecResult, SolverKind};

/// Written on the parameter-file line when no PES parameters are used.
pub const DUMMY_PARFILE: &str = "dummy";

const DEFAULT_NCOORD: i64 = 3;
const OXYGEN_16_MASS: f64 = 29156.9455997;

const CONTROL_KEYS: [&str; 11] = [
    "NPNT2", "JROT", "NEVAL", "NALF", "MAX2D", "MAX3D", "IDIA", "KMIN", "NPNT1", "IPAR", "MAX3D2",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorseParameters {
    pub re: f64,
    pub diss: f64,
    pub we: f64,
}

impl MorseParameters {
    pub const fn new(re: f64, diss: f64, we: f64) -> Self {
        Self { re, diss, we }
    }

    const fn to_array(self) -> [f64; 3] {
        [self.re, self.diss, self.we]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dvr3drjzInput {
    pub prt: NamelistLine,
    pub var: NamelistLine,
    /// `None` writes [`DUMMY_PARFILE`].
    pub parfile: Option<String>,
    pub ncoord: i64,
    pub npnt2: i64,
    pub jrot: i64,
    pub neval: i64,
    pub nalf: i64,
    pub max2d: i64,
    pub max3d: i64,
    pub idia: i64,
    pub kmin: i64,
    pub npnt1: i64,
    pub ipar: i64,
    pub max3d2: Option<i64>,
    pub title: String,
    pub fixcos: Option<f64>,
    pub xmass: [f64; 3],
    /// Rotational masses; `None` repeats `xmass`.
    pub xmassr: Option<[f64; 3]>,
    pub emax1: f64,
    pub emax2: f64,
    pub morse1: MorseParameters,
    /// `None` repeats `morse1`.
    pub morse2: Option<MorseParameters>,
    pub ezero: f64,
}

impl Dvr3drjzInput {
    pub fn defaults(profile: DefaultsProfile) -> Self {
        let (npnt, nalf, max2d, max3d, emax) = match profile {
            DefaultsProfile::Lite => (25, 35, 200, 400, 9000.0),
            DefaultsProfile::Heavy => (80, 75, 7000, 10000, 12000.0),
        };
        Self {
            prt: NamelistLine::single(
                Namelist::new("PRT")
                    .with("ztran", true)
                    .with("ztheta", false),
            ),
            var: NamelistLine::single(Namelist::new("VAR").with("meout", false)),
            parfile: None,
            ncoord: DEFAULT_NCOORD,
            npnt2: npnt,
            jrot: 0,
            neval: 150,
            nalf,
            max2d,
            max3d,
            idia: -2,
            kmin: 2,
            npnt1: npnt,
            ipar: 0,
            max3d2: None,
            title: "DVR POSITIONS CALC".to_string(),
            fixcos: None,
            xmass: [OXYGEN_16_MASS; 3],
            xmassr: None,
            emax1: emax,
            emax2: emax,
            morse1: MorseParameters::new(2.87, 0.06, 0.004),
            morse2: None,
            ezero: 0.0,
        }
    }

    /// Control keys in record order; MAX3D2 only when set.
    pub fn control_keys(&self) -> Vec<i64> {
        let mut keys = vec![
            self.npnt2, self.jrot, self.neval, self.nalf, self.max2d, self.max3d, self.idia,
            self.kmin, self.npnt1, self.ipar,
        ];
        keys.extend(self.max3d2);
        keys
    }

    pub fn parse(source: &str) -> CodecResult<Self> {
        let mut reader = RecordReader::new("DVR3DRJZ", source);
        let prt = decode_namelist_line(reader.next_line("PRT namelist")?)?;
        let var = decode_namelist_line(reader.next_line("VAR namelist")?)?;
        let parfile = match reader.next_line("parameter file")?.trim() {
            "" | DUMMY_PARFILE => None,
            name => Some(name.to_string()),
        };
        let ncoord = parse_optional_int(reader.next_line("NCOORD")?, "NCOORD")?
            .unwrap_or(DEFAULT_NCOORD);

        let fields = slice_fixed_width(
            reader.next_line("control keys")?,
            FieldWidths::Explicit(&[5; 11]),
        );
        let control = |index: usize| parse_required_int(fields[index], CONTROL_KEYS[index]);
        let (npnt2, jrot, neval, nalf) = (control(0)?, control(1)?, control(2)?, control(3)?);
        let (max2d, max3d, idia, kmin) = (control(4)?, control(5)?, control(6)?, control(7)?);
        let (npnt1, ipar) = (control(8)?, control(9)?);
        let max3d2 = parse_optional_int(fields[10], CONTROL_KEYS[10])?;

        let title = reader.next_line("title")?.trim_end().to_string();
        let fixcos = parse_optional_float(reader.next_line("FIXCOS")?, "FIXCOS")?;
        let xmass = read_fixed_floats(&mut reader, "XMASS", ["XMASS(1)", "XMASS(2)", "XMASS(3)"])?;
        let xmassr = read_fixed_floats(
            &mut reader,
            "XMASSR",
            ["XMASSR(1)", "XMASSR(2)", "XMASSR(3)"],
        )?;
        let [emax1, emax2] = read_fixed_floats(&mut reader, "EMAX", ["EMAX1", "EMAX2"])?;
        let [re1, diss1, we1] = read_fixed_floats(&mut reader, "r1 Morse", ["RE1", "DISS1", "WE1"])?;
        let [re2, diss2, we2] = read_fixed_floats(&mut reader, "r2 Morse", ["RE2", "DISS2", "WE2"])?;
        let ezero = parse_optional_float(reader.next_line_or_empty(), "EZERO")?.unwrap_or(0.0);

        let morse1 = MorseParameters::new(re1, diss1, we1);
        let morse2 = MorseParameters::new(re2, diss2, we2);
        Ok(Self {
            prt,
            var,
            parfile,
            ncoord,
            npnt2,
            jrot,
            neval,
            nalf,
            max2d,
            max3d,
            idia,
            kmin,
            npnt1,
            ipar,
            max3d2,
            title,
            fixcos,
            xmass,
            xmassr: (xmassr != xmass).then_some(xmassr),
            emax1,
            emax2,
            morse1,
            morse2: (morse2 != morse1).then_some(morse2),
            ezero,
        })
    }
}

impl InputRecord for Dvr3drjzInput {
    fn kind(&self) -> SolverKind {
        SolverKind::Dvr3drjz
    }

    fn render(&self) -> String {
        let morse2 = self.morse2.unwrap_or(self.morse1);
        let lines = [
            self.prt.render(),
            self.var.render(),
            self.parfile
                .clone()
                .unwrap_or_else(|| DUMMY_PARFILE.to_string()),
            format_int_fields(&[self.ncoord], 5),
            format_int_fields(&self.control_keys(), 5),
            self.title.trim_end().to_string(),
            self.fixcos
                .map(|fixcos| format!("{fixcos:.6}"))
                .unwrap_or_default(),
            format_fixed_fields(&self.xmass, 20, 7),
            format_fixed_fields(&self.xmassr.unwrap_or(self.xmass), 20, 7),
            format_fixed_fields(&[self.emax1, self.emax2], 20, 6),
            format_fixed_fields(&self.morse1.to_array(), 20, 6),
            format_fixed_fields(&morse2.to_array(), 20, 6),
            format_reference_energy(self.ezero),
        ];
        lines.join("\n")
    }
}

fn read_fixed_floats<const N: usize>(
    reader: &mut RecordReader<'_>,
    line: &str,
    names: [&'static str; N],
) -> CodecResult<[f64; N]> {
    let fields = slice_fixed_width(reader.next_line(line)?, FieldWidths::Explicit(&[20; N]));
    let mut values = [0.0; N];
    for ((value, field), name) in values.iter_mut().zip(fields).zip(names) {
        *value = parse_required_float(field, name)?;
    }
    Ok(values)
}
