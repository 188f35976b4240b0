//! Whitespace-column listings of states and transitions.
//!
//! Both files start with one header line; blank lines and lines starting
//! with `#` are ignored when reading.

use crate::domain::{DvrError, DvrResult, StateLabel, TransitionLabel};
use crate::serialization::read_text_artifact;
use std::collections::BTreeSet;
use std::path::Path;

/// Expands `0,1,3-5` into the sorted distinct values `[0, 1, 3, 4, 5]`.
pub fn extract_enumerated(text: &str) -> DvrResult<Vec<u32>> {
    let bad_format = || {
        DvrError::format(
            "FORMAT.ENUMERATION",
            format!("bad enumeration '{}' (expected e.g. 0,1,3-5)", text.trim()),
        )
    };
    let mut values = BTreeSet::new();
    for block in text.split(',').map(str::trim) {
        match block.split_once('-') {
            Some((lower, upper)) => {
                let lower: u32 = lower.trim().parse().map_err(|_| bad_format())?;
                let upper: u32 = upper.trim().parse().map_err(|_| bad_format())?;
                if lower > upper {
                    return Err(bad_format());
                }
                values.extend(lower..=upper);
            }
            None => {
                values.insert(block.parse::<u32>().map_err(|_| bad_format())?);
            }
        }
    }
    Ok(values.into_iter().collect())
}

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .skip(1)
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn listing_error(origin: &str, line: usize, detail: impl std::fmt::Display) -> DvrError {
    DvrError::parse(
        "PARSE.LISTING",
        format!("{}:{}: {}", origin, line, detail),
    )
}

fn column<T: std::str::FromStr>(
    token: &str,
    name: &str,
    origin: &str,
    line: usize,
) -> DvrResult<T> {
    token
        .parse()
        .map_err(|_| listing_error(origin, line, format!("cannot read {} from '{}'", name, token)))
}

pub fn parse_states(text: &str, origin: &str) -> DvrResult<Vec<StateLabel>> {
    data_lines(text)
        .map(|(line, content)| {
            let tokens: Vec<&str> = content.split_whitespace().collect();
            let [name, jrot, kmin, ipar, ..] = tokens.as_slice() else {
                return Err(listing_error(
                    origin,
                    line,
                    "expected the columns name jrot kmin ipar",
                ));
            };
            StateLabel::new(
                *name,
                column(jrot, "jrot", origin, line)?,
                column(kmin, "kmin", origin, line)?,
                column(ipar, "ipar", origin, line)?,
            )
        })
        .collect()
}

pub fn read_states(path: &Path) -> DvrResult<Vec<StateLabel>> {
    parse_states(&read_text_artifact(path)?, &path.display().to_string())
}

fn states_row(name: &str, jrot: &str, kmin: &str, ipar: &str, comment: &str) -> String {
    format!("{name:>10}{jrot:>5}{kmin:>5}{ipar:>5}{comment:>10}\n")
}

pub fn render_states(states: &[StateLabel]) -> String {
    let mut text = states_row("name", "jrot", "kmin", "ipar", "comment");
    for state in states {
        text.push_str(&states_row(
            &state.name,
            &state.jrot.to_string(),
            &state.kmin.to_string(),
            &state.ipar.to_string(),
            "",
        ));
    }
    text
}

/// Reads a transitions listing; the folder column must match the one derived
/// from the state and record columns.
pub fn parse_transitions(text: &str, origin: &str) -> DvrResult<Vec<TransitionLabel>> {
    data_lines(text)
        .map(|(line, content)| {
            let tokens: Vec<&str> = content.split_whitespace().collect();
            let [
                id,
                folder,
                jrot,
                kmin,
                ipar,
                jrot_,
                kmin_,
                ipar_,
                fort,
                fort_,
                name,
                name_,
            ] = tokens.as_slice()
            else {
                return Err(listing_error(origin, line, "expected 12 columns"));
            };
            let transition = TransitionLabel {
                id: id.to_string(),
                bra: StateLabel::new(
                    *name,
                    column(jrot, "jrot", origin, line)?,
                    column(kmin, "kmin", origin, line)?,
                    column(ipar, "ipar", origin, line)?,
                )?,
                ket: StateLabel::new(
                    *name_,
                    column(jrot_, "jrot", origin, line)?,
                    column(kmin_, "kmin", origin, line)?,
                    column(ipar_, "ipar", origin, line)?,
                )?,
                fort_bra: fort.to_string(),
                fort_ket: fort_.to_string(),
            };
            if transition.folder_name() != *folder {
                return Err(listing_error(
                    origin,
                    line,
                    format!(
                        "folder '{}' does not match its states (expected '{}')",
                        folder,
                        transition.folder_name()
                    ),
                ));
            }
            Ok(transition)
        })
        .collect()
}

pub fn read_transitions(path: &Path) -> DvrResult<Vec<TransitionLabel>> {
    parse_transitions(&read_text_artifact(path)?, &path.display().to_string())
}

pub fn render_transitions(transitions: &[TransitionLabel]) -> String {
    let mut text = format!(
        "{:>10}  {:>34}   {:>2} {:>1} {:>1}   {:>2} {:>1} {:>1}   {:>7} {:>7}   {:>8}  {:>8}\n",
        "id", "name", "J", "k", "i", "J", "k", "i", "fort", "fort", "state", "state"
    );
    for transition in transitions {
        let (bra, ket) = (&transition.bra, &transition.ket);
        text.push_str(&format!(
            "{:>10}  {:>34}   {:02} {:1} {:1}   {:02} {:1} {:1}   {:>7} {:>7}   {:>8}  {:>8}\n",
            transition.id,
            transition.folder_name(),
            bra.jrot,
            bra.kmin,
            bra.ipar,
            ket.jrot,
            ket.kmin,
            ket.ipar,
            transition.fort_bra,
            transition.fort_ket,
            bra.name,
            ket.name
        ));
    }
    text
}
