//! Text codec for the positional input records read by the DVR3D programs.
//!
//! Scalars follow Fortran list-directed conventions (`.true.`, `1.0d-40`), grouped
//! parameters are written as `&NAME key=value, ... &END` namelists and everything
//! else is fixed-column text handled by [`fixed`].

mod fixed;

pub use fixed::{
    FieldWidths, RecordReader, format_exponent_field, format_fixed_f64, format_fixed_fields,
    format_int_fields, format_reference_energy, parse_optional_float, parse_optional_int,
    parse_required_float, parse_required_int, slice_fixed_width,
};

use crate::domain::{CodecResult, DvrError};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to floats; nothing else converts.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode_scalar(self))
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

pub fn encode_scalar(value: &Scalar) -> String {
    match value {
        Scalar::Bool(true) => ".true.".to_string(),
        Scalar::Bool(false) => ".false.".to_string(),
        Scalar::Int(value) => value.to_string(),
        Scalar::Float(value) => encode_float(*value),
        Scalar::Str(value) => format!("'{}'", value.replace('\'', "''")),
    }
}

/// Shortest text that parses back to the same float and never reads as an integer.
pub fn encode_float(value: f64) -> String {
    let text = format!("{value:?}");
    if text.contains(['.', 'e', 'E']) || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

pub fn decode_scalar(text: &str) -> CodecResult<Scalar> {
    let trimmed = text.trim();
    let lowered = trimmed.to_ascii_lowercase();
    match lowered.as_str() {
        ".true." | "t" | ".t." => return Ok(Scalar::Bool(true)),
        ".false." | "f" | ".f." => return Ok(Scalar::Bool(false)),
        _ => {}
    }

    if let Some(literal) = quoted_literal(trimmed) {
        return Ok(Scalar::Str(literal));
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(Scalar::Int(value));
    }
    if let Some(value) = parse_fortran_float(&lowered) {
        return Ok(Scalar::Float(value));
    }

    Err(DvrError::type_mismatch(
        "TYPE.SCALAR",
        format!("variable '{}' has unexpected type", trimmed),
    ))
}

pub(crate) fn parse_fortran_float(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = text.parse::<f64>() {
        return Some(value);
    }
    if text.contains(['d', 'D']) {
        return text.replace(['d', 'D'], "e").parse::<f64>().ok();
    }
    None
}

fn quoted_literal(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    if text.len() < 2 || !text.ends_with(quote) {
        return None;
    }
    let inner = &text[1..text.len() - 1];
    let doubled = format!("{quote}{quote}");
    Some(inner.replace(&doubled, &quote.to_string()))
}

/// An ordered `&NAME key=value, ... ` group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Namelist {
    name: String,
    entries: Vec<(String, Scalar)>,
}

impl Namelist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.set(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[(String, Scalar)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    /// Replaces an existing key in place or appends a new one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&key))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn render(&self) -> String {
        encode_namelist(&self.name, &self.entries)
    }

    fn render_group(&self) -> String {
        format!("&{} {}", self.name.to_uppercase(), render_body(&self.entries))
    }
}

/// One physical input line holding one or more namelist groups closed by a single `&END`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamelistLine {
    groups: Vec<Namelist>,
}

impl NamelistLine {
    pub fn new(groups: Vec<Namelist>) -> Self {
        Self { groups }
    }

    pub fn single(group: Namelist) -> Self {
        Self {
            groups: vec![group],
        }
    }

    pub fn groups(&self) -> &[Namelist] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Namelist> {
        self.groups
            .iter()
            .find(|group| group.name.eq_ignore_ascii_case(name))
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Namelist> {
        self.groups
            .iter_mut()
            .find(|group| group.name.eq_ignore_ascii_case(name))
    }

    pub fn render(&self) -> String {
        let rendered = self
            .groups
            .iter()
            .map(Namelist::render_group)
            .collect::<Vec<_>>()
            .join(" ");
        format!("{rendered} &END")
    }
}

pub fn encode_namelist(name: &str, entries: &[(String, Scalar)]) -> String {
    format!("&{} {} &END", name.to_uppercase(), render_body(entries))
}

fn render_body(entries: &[(String, Scalar)]) -> String {
    entries
        .iter()
        .map(|(key, value)| format!("{}={}", key, encode_scalar(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decodes the first namelist group on `line`.
pub fn decode_namelist(line: &str) -> CodecResult<Namelist> {
    let mut parsed = decode_namelist_line(line)?;
    Ok(parsed.groups.remove(0))
}

pub fn decode_namelist_line(line: &str) -> CodecResult<NamelistLine> {
    let Some(&start) = unquoted_offsets(line, '&').first() else {
        return Err(missing_bracket(line));
    };

    let mut groups = Vec::new();
    let mut terminated = false;
    for segment in split_unquoted(&line[start + 1..], '&') {
        let segment = segment.trim_start();
        let (name, body) = match segment.find(char::is_whitespace) {
            Some(split) => (&segment[..split], &segment[split..]),
            None => (segment, ""),
        };
        if name.eq_ignore_ascii_case("end") {
            terminated = true;
            break;
        }
        if name.is_empty() {
            return Err(missing_bracket(line));
        }
        groups.push((name, body));
    }

    if !terminated {
        if let Some((_, body)) = groups.last_mut() {
            let trimmed = body.trim_end();
            let closing = trimmed.len().checked_sub(1);
            if closing.is_some() && unquoted_offsets(trimmed, '/').last() == closing.as_ref() {
                *body = &trimmed[..trimmed.len() - 1];
                terminated = true;
            }
        }
    }
    if !terminated || groups.is_empty() {
        return Err(missing_bracket(line));
    }

    let groups = groups
        .into_iter()
        .map(|(name, body)| decode_group(name, body))
        .collect::<CodecResult<Vec<_>>>()?;
    Ok(NamelistLine { groups })
}

fn decode_group(name: &str, body: &str) -> CodecResult<Namelist> {
    let mut namelist = Namelist::new(name);
    for pair in split_unquoted(body, ',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some((key, value)) = unquoted_offsets(pair, '=')
            .first()
            .map(|&offset| (&pair[..offset], &pair[offset + 1..]))
        else {
            return Err(DvrError::format(
                "FORMAT.NAMELIST_PAIR",
                format!("namelist &{} entry '{}' has no '='", name, pair),
            ));
        };
        namelist
            .entries
            .push((key.trim().to_string(), decode_scalar(value)?));
    }
    Ok(namelist)
}

/// Byte offsets of `delimiter` outside `'...'` and `"..."` literals. A doubled
/// quote closes and reopens the literal, so escaped quotes stay inside it.
fn unquoted_offsets(text: &str, delimiter: char) -> Vec<usize> {
    let mut open = None;
    let mut offsets = Vec::new();
    for (offset, c) in text.char_indices() {
        match open {
            Some(quote) if c == quote => open = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => open = Some(c),
            None if c == delimiter => offsets.push(offset),
            None => {}
        }
    }
    offsets
}

fn split_unquoted(text: &str, delimiter: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for offset in unquoted_offsets(text, delimiter) {
        pieces.push(&text[start..offset]);
        start = offset + delimiter.len_utf8();
    }
    pieces.push(&text[start..]);
    pieces
}

fn missing_bracket(line: &str) -> DvrError {
    DvrError::format(
        "FORMAT.NAMELIST",
        format!("cannot read namelist from '{}'", line.trim()),
    )
}
