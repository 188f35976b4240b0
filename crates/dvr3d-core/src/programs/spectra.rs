//! SPECTRA input: line list and band profile from the DIPOLE3B transition strengths.
//!
//! ```text
//! 1  &PRT ... &END
//! 2  title
//! 3  GE GO                                 2F10.2
//! 4  TEMP XMIN WMIN WMAX DWL Q             F10.3,E10.3,4F10.3
//! 5  &SPE ... &END
//! ```
//!
//! Lines 3 and 4 are read list-directed by the program, so they are decoded by
//! whitespace tokens (accepting `d` exponents) rather than by columns.

use super::DefaultsProfile;
use super::traits::InputRecord;
use crate::codec::{
    Namelist, NamelistLine, RecordReader, decode_namelist_line, format_exponent_field,
    format_fixed_f64, parse_required_float,
};
use crate::domain::{CodecResult, SolverKind};

#[derive(Debug, Clone, PartialEq)]
pub struct SpectraInput {
    pub prt: NamelistLine,
    pub title: String,
    /// Nuclear-spin times symmetry-degeneracy factors for even and odd IPAR.
    pub ge: f64,
    pub go: f64,
    pub temp: f64,
    /// Intensity cutoff.
    pub xmin: f64,
    pub wmin: f64,
    pub wmax: f64,
    /// Profile half-width, cm-1.
    pub dwl: f64,
    /// Partition function.
    pub q: f64,
    pub spe: NamelistLine,
}

impl SpectraInput {
    /// Both profiles share one table for SPECTRA.
    pub fn defaults(_profile: DefaultsProfile) -> Self {
        Self {
            prt: NamelistLine::single(Namelist::new("PRT")),
            title: "DVR SPECTRA CALC".to_string(),
            ge: 1.0,
            go: 3.0,
            temp: 296.0,
            xmin: 1.0e-35,
            wmin: 0.0,
            wmax: 12000.0,
            dwl: 0.0,
            q: 3483.8,
            spe: NamelistLine::single(Namelist::new("SPE")),
        }
    }

    /// Sets a `&PRT` key, e.g. the zero-point energy `gz`.
    pub fn set_prt(&mut self, key: &str, value: f64) {
        if let Some(group) = self.prt.group_mut("PRT") {
            group.set(key, value);
            return;
        }
        let mut groups = self.prt.groups().to_vec();
        groups.insert(0, Namelist::new("PRT").with(key, value));
        self.prt = NamelistLine::new(groups);
    }

    pub fn parse(source: &str) -> CodecResult<Self> {
        let mut reader = RecordReader::new("SPECTRA", source);
        let prt = decode_namelist_line(reader.next_line("PRT namelist")?)?;
        let title = reader.next_line("title")?.trim_end().to_string();
        let [ge, go] = read_list(&mut reader, "degeneracy factors", ["GE", "GO"])?;
        let [temp, xmin, wmin, wmax, dwl, q] = read_list(
            &mut reader,
            "temperature and window",
            ["TEMP", "XMIN", "WMIN", "WMAX", "DWL", "Q"],
        )?;
        let spe = decode_namelist_line(reader.next_line("SPE namelist")?)?;

        Ok(Self {
            prt,
            title,
            ge,
            go,
            temp,
            xmin,
            wmin,
            wmax,
            dwl,
            q,
            spe,
        })
    }
}

impl InputRecord for SpectraInput {
    fn kind(&self) -> SolverKind {
        SolverKind::Spectra
    }

    fn render(&self) -> String {
        let factors = format!(
            "{}{}",
            format_fixed_f64(self.ge, 10, 2),
            format_fixed_f64(self.go, 10, 2)
        );
        let window = format!(
            "{}{}{}{}{}{}",
            format_fixed_f64(self.temp, 10, 3),
            format_exponent_field(self.xmin, 10, 3),
            format_fixed_f64(self.wmin, 10, 3),
            format_fixed_f64(self.wmax, 10, 3),
            format_fixed_f64(self.dwl, 10, 3),
            format_fixed_f64(self.q, 10, 3)
        );
        [
            self.prt.render(),
            self.title.trim_end().to_string(),
            factors,
            window,
            self.spe.render(),
        ]
        .join("\n")
    }
}

fn read_list<const N: usize>(
    reader: &mut RecordReader<'_>,
    line: &str,
    names: [&'static str; N],
) -> CodecResult<[f64; N]> {
    let tokens: Vec<&str> = reader.next_line(line)?.split_whitespace().collect();
    if tokens.len() < N {
        return Err(reader.parse_error(
            line,
            format!("expected {} values, found {}", N, tokens.len()),
        ));
    }
    let mut values = [0.0; N];
    for ((value, token), name) in values.iter_mut().zip(tokens).zip(names) {
        *value = parse_required_float(token, name)?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::SpectraInput;
    use crate::codec::Scalar;
    use crate::programs::{DefaultsProfile, InputRecord};

    #[test]
    fn renders_the_lite_record() {
        let input = SpectraInput::defaults(DefaultsProfile::Lite);
        assert_eq!(
            input.render(),
            "&PRT  &END\nDVR SPECTRA CALC\n      1.00      3.00\n\
             \x20  296.000 1.000E-35     0.000 12000.000     0.000  3483.800\n&SPE  &END"
        );
    }

    #[test]
    fn zero_point_energy_goes_into_prt() {
        let mut input = SpectraInput::defaults(DefaultsProfile::Lite);
        input.set_prt("gz", 1443.586);
        input.set_prt("gz", 1443.6);
        assert_eq!(
            input.prt.group("PRT").and_then(|group| group.get("gz")),
            Some(&Scalar::Float(1443.6))
        );
        assert!(input.render().starts_with("&PRT gz=1443.6 &END"));
    }

    #[test]
    fn list_directed_lines_accept_fortran_exponents() {
        let source = " &PRT zsort=.true., zout=.false., GZ=3481.50 &END\n\
                      Spectra for dipole moment of HCN\n\
                      \x20    1.0     1.0\n\
                      \x202000.0     1.0d-40       0.0   18000.0    1.0       20285.9\n\
                      \x20&SPE  zplot=.true., zlist=.true. /";
        let parsed = SpectraInput::parse(source).expect("record should parse");
        assert_eq!(parsed.ge, 1.0);
        assert_eq!(parsed.temp, 2000.0);
        assert_eq!(parsed.xmin, 1.0e-40);
        assert_eq!(parsed.q, 20285.9);
        assert_eq!(
            parsed.spe.group("SPE").and_then(|group| group.get("zlist")),
            Some(&Scalar::Bool(true))
        );
    }

    #[test]
    fn parse_inverts_render() {
        let mut input = SpectraInput::defaults(DefaultsProfile::Heavy);
        input.set_prt("gz", 1443.586);
        input.q = 3500.25;
        let parsed = SpectraInput::parse(&input.render()).expect("record should parse");
        assert_eq!(parsed, input);
    }

    #[test]
    fn short_window_line_is_a_parse_error() {
        let source = "&PRT  &END\nT\n 1.0 3.0\n 296.0 1.0e-35\n&SPE  &END";
        let error = SpectraInput::parse(source).expect_err("window line is short");
        assert_eq!(error.placeholder(), "PARSE.RECORD_FIELD");
        assert!(error.message().contains("expected 6 values, found 2"));
    }
}
