use crate::domain::{DvrError, DvrResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniEntry {
    pub key: String,
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    entries: Vec<IniEntry>,
}

impl IniSection {
    pub fn entries(&self) -> &[IniEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &str) -> Option<&IniEntry> {
        self.entries
            .iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(key))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    pub fn sections(&self) -> &[IniSection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections
            .iter()
            .find(|section| section.name.eq_ignore_ascii_case(name))
    }
}

/// Reads `[SECTION]` headers and `key = value` lines.
///
/// Comments are full lines starting with `#` or `;`; values may legitimately contain both
/// characters. Keys are lowercased. A key line without `=` is a key with a blank value.
pub fn parse_ini(text: &str) -> DvrResult<IniDocument> {
    let mut document = IniDocument::default();

    for (index, raw_line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header.strip_suffix(']').ok_or_else(|| {
                DvrError::format(
                    "FORMAT.CONFIG_SECTION",
                    format!("line {}: unterminated section header '{}'", line_number, line),
                )
            })?;
            let name = name.trim();
            if document.section(name).is_some() {
                return Err(DvrError::format(
                    "FORMAT.CONFIG_DUPLICATE",
                    format!("line {}: section [{}] appears twice", line_number, name),
                ));
            }
            document.sections.push(IniSection {
                name: name.to_string(),
                entries: Vec::new(),
            });
            continue;
        }

        let (key, value) = line.split_once('=').unwrap_or((line, ""));
        let key = key.trim().to_ascii_lowercase();
        let section = document.sections.last_mut().ok_or_else(|| {
            DvrError::format(
                "FORMAT.CONFIG_SECTION",
                format!("line {}: key '{}' appears before any section", line_number, key),
            )
        })?;
        if section.entry(&key).is_some() {
            return Err(DvrError::format(
                "FORMAT.CONFIG_DUPLICATE",
                format!(
                    "line {}: key '{}' appears twice in section [{}]",
                    line_number, key, section.name
                ),
            ));
        }
        section.entries.push(IniEntry {
            key,
            value: value.trim().to_string(),
            line: line_number,
        });
    }

    Ok(document)
}
