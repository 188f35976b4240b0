use super::parse_fortran_float;
use crate::domain::{CodecResult, DvrError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidths<'a> {
    /// Repeat one width until the line is consumed; the last field may be shorter.
    Uniform(usize),
    /// Exactly one field per width; fields past the end of the line are empty.
    Explicit(&'a [usize]),
}

/// Cuts `line` into positional fields without trimming or tokenizing.
///
/// Widths count characters. A zero uniform width yields the whole line as one field.
pub fn slice_fixed_width<'s>(line: &'s str, widths: FieldWidths<'_>) -> Vec<&'s str> {
    let boundaries: Vec<usize> = line
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(line.len()))
        .collect();
    let char_count = boundaries.len() - 1;
    let byte_at = |chars: usize| boundaries[chars.min(char_count)];

    match widths {
        FieldWidths::Uniform(0) => {
            if line.is_empty() {
                Vec::new()
            } else {
                vec![line]
            }
        }
        FieldWidths::Uniform(width) => (0..char_count.div_ceil(width))
            .map(|index| &line[byte_at(index * width)..byte_at((index + 1) * width)])
            .collect(),
        FieldWidths::Explicit(widths) => {
            let mut position = 0;
            widths
                .iter()
                .map(|width| {
                    let start = position;
                    position += width;
                    &line[byte_at(start)..byte_at(position)]
                })
                .collect()
        }
    }
}

pub fn format_fixed_f64(value: f64, width: usize, precision: usize) -> String {
    format!(
        "{value:>width$.precision$}",
        width = width,
        precision = precision
    )
}

/// `nFw.p` edit descriptor: values concatenated without separators.
pub fn format_fixed_fields(values: &[f64], width: usize, precision: usize) -> String {
    values
        .iter()
        .map(|value| format_fixed_f64(*value, width, precision))
        .collect()
}

/// `nIw` edit descriptor.
pub fn format_int_fields(values: &[i64], width: usize) -> String {
    values
        .iter()
        .map(|value| format!("{value:>width$}", width = width))
        .collect()
}

/// `Ew.p` edit descriptor with a signed two-digit exponent, e.g. ` 1.000E-35`.
pub fn format_exponent_field(value: f64, width: usize, precision: usize) -> String {
    if !value.is_finite() {
        return format!("{value:>width$}", width = width);
    }
    let rendered = format!("{value:.precision$E}", precision = precision);
    let (mantissa, exponent) = rendered.split_once('E').unwrap_or((&rendered, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let field = format!("{mantissa}E{sign}{:02}", exponent.abs());
    format!("{field:>width$}", width = width)
}

/// The trailing zero-point energy line shared by every record kind.
pub fn format_reference_energy(value: f64) -> String {
    format!("{value:.11}")
}

pub fn parse_optional_int(field: &str, name: &'static str) -> CodecResult<Option<i64>> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<i64>().map(Some).map_err(|_| {
        DvrError::parse(
            "PARSE.FIXED_FIELD",
            format!("field {} holds '{}', expected an integer", name, trimmed),
        )
    })
}

pub fn parse_required_int(field: &str, name: &'static str) -> CodecResult<i64> {
    parse_optional_int(field, name)?.ok_or_else(|| missing_field(name))
}

pub fn parse_optional_float(field: &str, name: &'static str) -> CodecResult<Option<f64>> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_fortran_float(&trimmed.to_ascii_lowercase())
        .map(Some)
        .ok_or_else(|| {
            DvrError::parse(
                "PARSE.FIXED_FIELD",
                format!("field {} holds '{}', expected a real number", name, trimmed),
            )
        })
}

pub fn parse_required_float(field: &str, name: &'static str) -> CodecResult<f64> {
    parse_optional_float(field, name)?.ok_or_else(|| missing_field(name))
}

fn missing_field(name: &'static str) -> DvrError {
    DvrError::parse(
        "PARSE.FIXED_FIELD",
        format!("field {} is blank but required", name),
    )
}

/// Sequential reader over the physical lines of an input record.
#[derive(Debug)]
pub struct RecordReader<'a> {
    record: &'static str,
    lines: std::str::Lines<'a>,
    line_number: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(record: &'static str, source: &'a str) -> Self {
        Self {
            record,
            lines: source.lines(),
            line_number: 0,
        }
    }

    pub const fn line_number(&self) -> usize {
        self.line_number
    }

    /// Next line with its line terminator removed; fails when the record is exhausted.
    pub fn next_line(&mut self, field: &str) -> CodecResult<&'a str> {
        self.line_number += 1;
        self.lines.next().ok_or_else(|| {
            DvrError::parse(
                "PARSE.RECORD_TRUNCATED",
                format!(
                    "{} input ended at line {} before {}",
                    self.record, self.line_number, field
                ),
            )
        })
    }

    /// Next line or an empty string past the end, for trailing lines with defaults.
    pub fn next_line_or_empty(&mut self) -> &'a str {
        self.line_number += 1;
        self.lines.next().unwrap_or("")
    }

    pub fn parse_error(&self, field: &str, detail: impl std::fmt::Display) -> DvrError {
        DvrError::parse(
            "PARSE.RECORD_FIELD",
            format!(
                "{} line {} ({}): {}",
                self.record, self.line_number, field, detail
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FieldWidths, RecordReader, format_exponent_field, format_fixed_f64, format_fixed_fields,
        format_int_fields, format_reference_energy, parse_optional_int, parse_required_float,
        slice_fixed_width,
    };
    use crate::domain::DvrErrorCategory;

    #[test]
    fn uniform_slices_reconstruct_the_line() {
        let lines = ["", "a", "abcde", "abcdefghijk", "   70    3  150   50", "ΔJ=1 θ"];
        for line in lines {
            for width in 1..=7 {
                let pieces = slice_fixed_width(line, FieldWidths::Uniform(width));
                assert_eq!(pieces.concat(), line);
                assert_eq!(pieces.len(), line.chars().count().div_ceil(width));
            }
        }
    }

    #[test]
    fn explicit_widths_pad_with_empty_fields() {
        let pieces = slice_fixed_width(" 9999 9999    2", FieldWidths::Explicit(&[5; 6]));
        assert_eq!(pieces, [" 9999", " 9999", "    2", "", "", ""]);
        let pieces = slice_fixed_width("abc", FieldWidths::Explicit(&[2, 2, 2]));
        assert_eq!(pieces, ["ab", "c", ""]);
    }

    #[test]
    fn blank_columns_stay_blank() {
        let pieces = slice_fixed_width("   10          20", FieldWidths::Uniform(5));
        assert_eq!(pieces, ["   10", "     ", "     ", "20"]);
        assert_eq!(parse_optional_int(pieces[1], "NV1").expect("blank"), None);
    }

    #[test]
    fn fixed_width_float_formatting_is_deterministic() {
        assert_eq!(format_fixed_f64(1.23, 13, 5), "      1.23000");
        assert_eq!(
            format_fixed_fields(&[29156.9455997, 2.87], 20, 7),
            "       29156.9455997           2.8700000"
        );
    }

    #[test]
    fn integer_fields_are_right_aligned() {
        assert_eq!(
            format_int_fields(&[25, 0, 150, -2], 5),
            "   25    0  150   -2"
        );
        assert_eq!(format_int_fields(&[123456], 5), "123456");
    }

    #[test]
    fn exponent_fields_use_two_digit_signed_exponents() {
        assert_eq!(format_exponent_field(1.0e-35, 10, 3), " 1.000E-35");
        assert_eq!(format_exponent_field(12000.0, 10, 3), " 1.200E+04");
        assert_eq!(format_exponent_field(0.0, 10, 3), " 0.000E+00");
    }

    #[test]
    fn reference_energy_has_eleven_decimals() {
        assert_eq!(format_reference_energy(0.0), "0.00000000000");
        assert_eq!(format_reference_energy(1443.58613558344), "1443.58613558344");
    }

    #[test]
    fn required_blank_field_is_a_parse_error() {
        let error = parse_required_float("      ", "EMAX1").expect_err("blank field");
        assert_eq!(error.category(), DvrErrorCategory::ParseError);
        assert!(error.message().contains("EMAX1"));
        let error = parse_optional_int("  x  ", "NPNT2").expect_err("bad integer");
        assert!(error.message().contains("NPNT2"));
    }

    #[test]
    fn reader_reports_truncated_records() {
        let mut reader = RecordReader::new("ROTLEV3B", "&PRT  &END\n 9999");
        reader.next_line("PRT namelist").expect("line 1");
        reader.next_line("control keys").expect("line 2");
        let error = reader.next_line("title").expect_err("record is truncated");
        assert_eq!(error.placeholder(), "PARSE.RECORD_TRUNCATED");
        assert!(error.message().contains("line 3 before title"));
        assert_eq!(reader.next_line_or_empty(), "");
    }
}
