pub mod ini;
pub mod intensities;
pub mod molecule;
pub mod positions;

use crate::codec::{Scalar, encode_float, parse_fortran_float};
use crate::domain::{DvrError, DvrResult, ProjectKind};
use crate::serialization::{read_text_artifact, write_text_artifact};
use ini::parse_ini;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
}

impl FieldKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Bool => "boolean",
        }
    }

    /// Parses a non-blank config value.
    pub fn parse(self, text: &str) -> Option<Scalar> {
        let text = text.trim();
        match self {
            Self::Str => Some(Scalar::Str(text.to_string())),
            Self::Int => text.parse::<i64>().ok().map(Scalar::Int),
            Self::Float => parse_fortran_float(&text.to_ascii_lowercase()).map(Scalar::Float),
            Self::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | ".true." | "t" | ".t." | "1" => Some(Scalar::Bool(true)),
                "false" | ".false." | "f" | ".f." | "0" => Some(Scalar::Bool(false)),
                _ => None,
            },
        }
    }

    pub fn render(self, value: &Scalar) -> String {
        match (self, value) {
            (Self::Float, Scalar::Float(number)) => encode_float(*number),
            (Self::Float, Scalar::Int(number)) => encode_float(*number as f64),
            (Self::Bool, Scalar::Bool(flag)) => flag.to_string(),
            (_, Scalar::Str(text)) => text.clone(),
            (_, other) => other.to_string(),
        }
    }

    fn accepts(self, value: &Scalar) -> bool {
        matches!(
            (self, value),
            (Self::Str, Scalar::Str(_))
                | (Self::Int, Scalar::Int(_))
                | (Self::Float, Scalar::Float(_) | Scalar::Int(_))
                | (Self::Bool, Scalar::Bool(_))
        )
    }
}

/// Default value usable in static schema tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Str(&'static str),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    pub fn to_scalar(self) -> Scalar {
        match self {
            Self::Str(text) => Scalar::Str(text.to_string()),
            Self::Int(value) => Scalar::Int(value),
            Self::Float(value) => Scalar::Float(value),
            Self::Bool(value) => Scalar::Bool(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub comment: &'static [&'static str],
    pub default: Option<Literal>,
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        kind: FieldKind,
        comment: &'static [&'static str],
        default: Option<Literal>,
    ) -> Self {
        Self {
            name,
            kind,
            comment,
            default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionSpec {
    pub name: &'static str,
    pub module: &'static str,
    pub header: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SectionSpec {
    pub fn field(&self, key: &str) -> Option<(usize, &'static FieldSpec)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.name.eq_ignore_ascii_case(key))
    }
}

/// A named bundle of values for one template module, optionally layered on another preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub module: &'static str,
    pub name: &'static str,
    pub summary: &'static str,
    pub extends: Option<&'static str>,
    pub values: &'static [(&'static str, Literal)],
}

impl Preset {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

#[derive(Debug, PartialEq)]
pub struct Schema {
    pub project: ProjectKind,
    pub sections: &'static [SectionSpec],
    pub presets: &'static [Preset],
}

impl Schema {
    pub fn section(&self, name: &str) -> Option<(usize, &'static SectionSpec)> {
        self.sections
            .iter()
            .enumerate()
            .find(|(_, section)| section.name.eq_ignore_ascii_case(name))
    }

    pub fn section_for_module(&self, module: &str) -> Option<&'static SectionSpec> {
        self.sections
            .iter()
            .find(|section| section.module.eq_ignore_ascii_case(module))
    }

    /// Resolves `module.PRESET` into the chain of presets to apply, base first.
    pub fn preset_chain(&self, qualified: &str) -> DvrResult<Vec<&'static Preset>> {
        let (module, name) = qualified.split_once('.').ok_or_else(|| {
            DvrError::format(
                "FORMAT.TEMPLATE_NAME",
                format!("template '{}' must have the form module.PRESET", qualified),
            )
        })?;
        let mut chain = Vec::new();
        let mut next = Some(name);
        while let Some(current) = next {
            let preset = self
                .presets
                .iter()
                .find(|preset| preset.module == module && preset.name == current)
                .ok_or_else(|| {
                    DvrError::lookup(
                        "LOOKUP.TEMPLATE",
                        format!("unknown template '{}.{}'", module, current),
                    )
                })?;
            if chain.iter().any(|seen: &&Preset| seen.name == preset.name) {
                return Err(DvrError::internal(
                    "SYS.TEMPLATE_CYCLE",
                    format!("template '{}' extends itself", preset.qualified_name()),
                ));
            }
            chain.push(preset);
            next = preset.extends;
        }
        chain.reverse();
        Ok(chain)
    }

    pub fn describe_presets(&self) -> String {
        let mut text = String::from("Available templates:\n");
        for section in self.sections {
            let presets: Vec<&Preset> = self
                .presets
                .iter()
                .filter(|preset| preset.module == section.module)
                .collect();
            if presets.is_empty() {
                continue;
            }
            text.push_str(&format!("\n{} [{}]\n", section.module, section.name));
            for preset in presets {
                text.push_str(&format!(
                    "  {:<40} {}\n",
                    preset.qualified_name(),
                    preset.summary
                ));
            }
        }
        text
    }
}

/// Tri-state value of one configuration field.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Unset,
    Default(Scalar),
    Explicit(Scalar),
}

impl Setting {
    pub fn value(&self) -> Option<&Scalar> {
        match self {
            Self::Unset => None,
            Self::Default(value) | Self::Explicit(value) => Some(value),
        }
    }

    pub const fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Every declared section and key must be present; blank values become `Unset`.
    Strict,
    /// Missing sections and keys are tolerated; blank values keep the current setting.
    IgnoreEmpty,
}

#[derive(Debug, Clone, PartialEq)]
struct SectionValues {
    spec: &'static SectionSpec,
    settings: Vec<Setting>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    schema: &'static Schema,
    sections: Vec<SectionValues>,
}

impl ParameterSet {
    pub fn new(schema: &'static Schema) -> Self {
        let sections = schema
            .sections
            .iter()
            .map(|spec| SectionValues {
                spec,
                settings: spec
                    .fields
                    .iter()
                    .map(|field| match field.default {
                        Some(literal) => Setting::Default(literal.to_scalar()),
                        None => Setting::Unset,
                    })
                    .collect(),
            })
            .collect();
        Self { schema, sections }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn apply_preset(&mut self, qualified: &str) -> DvrResult<()> {
        for preset in self.schema.preset_chain(qualified)? {
            let section = self
                .schema
                .section_for_module(preset.module)
                .ok_or_else(|| {
                    DvrError::internal(
                        "SYS.TEMPLATE_MODULE",
                        format!("template module '{}' has no section", preset.module),
                    )
                })?;
            for (key, literal) in preset.values {
                self.set(section.name, key, Setting::Default(literal.to_scalar()))?;
            }
            debug!(template = %preset.qualified_name(), "applied template");
        }
        Ok(())
    }

    fn locate(&self, section: &str, key: &str) -> DvrResult<(usize, usize)> {
        let (section_index, spec) = self.schema.section(section).ok_or_else(|| {
            DvrError::lookup(
                "LOOKUP.CONFIG_SECTION",
                format!("unknown config section [{}]", section),
            )
        })?;
        let (field_index, _) = spec.field(key).ok_or_else(|| {
            DvrError::lookup(
                "LOOKUP.CONFIG_KEY",
                format!("unknown key '{}' in section [{}]", key, spec.name),
            )
        })?;
        Ok((section_index, field_index))
    }

    pub fn setting(&self, section: &str, key: &str) -> DvrResult<&Setting> {
        let (section_index, field_index) = self.locate(section, key)?;
        Ok(&self.sections[section_index].settings[field_index])
    }

    pub fn set(&mut self, section: &str, key: &str, setting: Setting) -> DvrResult<()> {
        let (section_index, field_index) = self.locate(section, key)?;
        let values = &mut self.sections[section_index];
        let field = &values.spec.fields[field_index];
        if let Some(value) = setting.value() {
            if !field.kind.accepts(value) {
                return Err(DvrError::type_mismatch(
                    "TYPE.CONFIG_VALUE",
                    format!(
                        "key '{}' in section [{}] expects a {} but got {}",
                        field.name,
                        values.spec.name,
                        field.kind.as_str(),
                        value.type_name()
                    ),
                ));
            }
        }
        values.settings[field_index] = setting;
        Ok(())
    }

    /// Parses `text` per the declared field type; a blank value unsets the field.
    pub fn set_text(&mut self, section: &str, key: &str, text: &str) -> DvrResult<()> {
        let (section_index, field_index) = self.locate(section, key)?;
        let spec = self.sections[section_index].spec;
        let field = &spec.fields[field_index];
        let setting = parse_setting(spec, field, text)?;
        self.sections[section_index].settings[field_index] = setting;
        Ok(())
    }

    pub fn value(&self, section: &str, key: &str) -> Option<&Scalar> {
        self.setting(section, key).ok().and_then(Setting::value)
    }

    pub fn str_value(&self, section: &str, key: &str) -> Option<&str> {
        self.value(section, key).and_then(Scalar::as_str)
    }

    pub fn int_value(&self, section: &str, key: &str) -> Option<i64> {
        self.value(section, key).and_then(Scalar::as_int)
    }

    pub fn float_value(&self, section: &str, key: &str) -> Option<f64> {
        self.value(section, key).and_then(Scalar::as_float)
    }

    pub fn bool_value(&self, section: &str, key: &str) -> Option<bool> {
        self.value(section, key).and_then(Scalar::as_bool)
    }

    pub fn require_str(&self, section: &str, key: &str) -> DvrResult<&str> {
        self.str_value(section, key)
            .ok_or_else(|| unset_value(section, key))
    }

    pub fn require_int(&self, section: &str, key: &str) -> DvrResult<i64> {
        self.int_value(section, key)
            .ok_or_else(|| unset_value(section, key))
    }

    pub fn require_float(&self, section: &str, key: &str) -> DvrResult<f64> {
        self.float_value(section, key)
            .ok_or_else(|| unset_value(section, key))
    }

    pub fn require_bool(&self, section: &str, key: &str) -> DvrResult<bool> {
        self.bool_value(section, key)
            .ok_or_else(|| unset_value(section, key))
    }

    /// Applies `SECTION.key=value; SECTION.key2=value2` overrides from the command line.
    pub fn apply_overrides(&mut self, overrides: &str) -> DvrResult<()> {
        for assignment in overrides.split(';') {
            let assignment = assignment.trim();
            if assignment.is_empty() {
                continue;
            }
            let (path, value) = assignment.split_once('=').ok_or_else(|| {
                DvrError::format(
                    "FORMAT.CONFIG_OVERRIDE",
                    format!("override '{}' must have the form SECTION.key=value", assignment),
                )
            })?;
            let (section, key) = path.trim().split_once('.').ok_or_else(|| {
                DvrError::format(
                    "FORMAT.CONFIG_OVERRIDE",
                    format!("override target '{}' must have the form SECTION.key", path.trim()),
                )
            })?;
            self.set_text(section.trim(), key.trim(), value)?;
        }
        Ok(())
    }

    pub fn load(&mut self, path: &Path, mode: LoadMode) -> DvrResult<()> {
        let text = read_text_artifact(path)?;
        self.load_str(&text, &path.display().to_string(), mode)
    }

    pub fn load_str(&mut self, text: &str, origin: &str, mode: LoadMode) -> DvrResult<()> {
        let document = parse_ini(text)?;

        for document_section in document.sections() {
            if self.schema.section(&document_section.name).is_none() {
                warn!(
                    section = %document_section.name,
                    origin,
                    "ignoring unknown config section"
                );
            }
        }

        for values in &mut self.sections {
            let spec = values.spec;
            let Some(document_section) = document.section(spec.name) else {
                if mode == LoadMode::Strict {
                    return Err(DvrError::lookup(
                        "LOOKUP.CONFIG_SECTION",
                        format!("missing section [{}] in {}", spec.name, origin),
                    ));
                }
                continue;
            };

            for entry in document_section.entries() {
                if spec.field(&entry.key).is_none() {
                    warn!(
                        section = spec.name,
                        key = %entry.key,
                        origin,
                        "ignoring unknown config key"
                    );
                }
            }

            for (index, field) in spec.fields.iter().enumerate() {
                let Some(entry) = document_section.entry(field.name) else {
                    if mode == LoadMode::Strict {
                        return Err(DvrError::lookup(
                            "LOOKUP.CONFIG_KEY",
                            format!(
                                "missing key '{}' in section [{}] of {}",
                                field.name, spec.name, origin
                            ),
                        ));
                    }
                    continue;
                };
                if entry.value.trim().is_empty() && mode == LoadMode::IgnoreEmpty {
                    continue;
                }
                values.settings[index] = parse_setting(spec, field, &entry.value)?;
            }
        }
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut text = format!(
            "# dvr3d {} project configuration.\n# Blank values are unset.\n",
            self.schema.project
        );
        for values in &self.sections {
            let rule = "#".repeat(60);
            text.push_str(&format!(
                "\n{rule}\n# {}\n{rule}\n[{}]\n",
                values.spec.header, values.spec.name
            ));
            for (field, setting) in values.spec.fields.iter().zip(&values.settings) {
                text.push('\n');
                for line in field.comment {
                    text.push_str(&format!("# {}\n", line));
                }
                match setting.value() {
                    Some(value) => {
                        text.push_str(&format!("{} = {}\n", field.name, field.kind.render(value)))
                    }
                    None => text.push_str(&format!("{} = \n", field.name)),
                }
            }
        }
        text
    }

    pub fn save(&self, path: &Path) -> DvrResult<()> {
        write_text_artifact(path, &self.render())
    }
}

fn parse_setting(spec: &SectionSpec, field: &FieldSpec, text: &str) -> DvrResult<Setting> {
    if text.trim().is_empty() {
        return Ok(Setting::Unset);
    }
    field.kind.parse(text).map(Setting::Explicit).ok_or_else(|| {
        DvrError::type_mismatch(
            "TYPE.CONFIG_VALUE",
            format!(
                "key '{}' in section [{}]: cannot read '{}' as {}",
                field.name,
                spec.name,
                text.trim(),
                field.kind.as_str()
            ),
        )
    })
}

fn unset_value(section: &str, key: &str) -> DvrError {
    DvrError::lookup(
        "LOOKUP.CONFIG_VALUE",
        format!("key '{}' in section [{}] is not set", key, section),
    )
}

/// Splits a `a; b; c` list value, dropping blank items.
pub fn split_list(value: &str) -> Vec<&str> {
    value
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}
