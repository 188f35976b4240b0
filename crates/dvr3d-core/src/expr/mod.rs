//! Safe expression grammar for state naming patterns and transition selection rules.
//!
//! Predicates cover integer arithmetic (`+ - * // %`), comparisons (chainable), `in`
//! membership over `(..)`/`[..]` lists or substrings, `and`/`or`/`not`, string and integer
//! literals and the functions `abs`, `min`, `max` and `len`. Names are checked against the
//! caller's variable list when the expression is compiled.

mod parser;

use crate::domain::{DvrError, DvrResult};
use parser::{FUNCTIONS, Node};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
            Self::List(_) => "list",
        }
    }

    fn to_bool(&self, operation: &'static str) -> Result<bool, ExpressionError> {
        match self {
            Self::Bool(flag) => Ok(*flag),
            other => Err(ExpressionError::NotBoolean {
                operation,
                found: other.type_name(),
            }),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(text) => f.write_str(text),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("invalid literal '{literal}' at offset {offset}")]
    InvalidLiteral { literal: String, offset: usize },
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },
    #[error("{function}() takes {expected} argument(s), got {actual}")]
    WrongArity {
        function: String,
        expected: &'static str,
        actual: usize,
    },
    #[error("unsupported operand types for '{operation}': {left} and {right}")]
    TypeMismatch {
        operation: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("'{operation}' expects a boolean, got {found}")]
    NotBoolean {
        operation: &'static str,
        found: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in '{operation}'")]
    Overflow { operation: &'static str },
    #[error("invalid format field '{field}'")]
    InvalidFormat { field: String },
}

impl ExpressionError {
    pub fn into_dvr_error(self, expression: &str) -> DvrError {
        let message = format!("expression '{}': {}", expression, self);
        match self {
            Self::UnknownVariable { .. } | Self::UnknownFunction { .. } => {
                DvrError::lookup("LOOKUP.EXPRESSION_NAME", message)
            }
            Self::WrongArity { .. }
            | Self::TypeMismatch { .. }
            | Self::NotBoolean { .. }
            | Self::DivisionByZero
            | Self::Overflow { .. } => DvrError::type_mismatch("TYPE.EXPRESSION", message),
            _ => DvrError::format("FORMAT.EXPRESSION", message),
        }
    }
}

/// Named values visible to an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: Vec<(&'static str, Value)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.values.iter_mut().find(|(known, _)| *known == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, value)| value)
    }
}

fn check_names(node: &Node, variables: &[&str]) -> Result<(), ExpressionError> {
    let mut referenced = Vec::new();
    let mut functions = Vec::new();
    node.visit_names(&mut referenced, &mut functions);
    if let Some(name) = referenced.iter().find(|name| !variables.contains(*name)) {
        return Err(ExpressionError::UnknownVariable {
            name: (*name).to_string(),
        });
    }
    if let Some(name) = functions.iter().find(|name| !FUNCTIONS.contains(*name)) {
        return Err(ExpressionError::UnknownFunction {
            name: (*name).to_string(),
        });
    }
    Ok(())
}

/// A compiled boolean selection rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    text: String,
    root: Node,
}

impl Predicate {
    pub fn compile(text: &str, variables: &[&str]) -> DvrResult<Self> {
        let root = parser::parse(text).map_err(|error| error.into_dvr_error(text))?;
        check_names(&root, variables).map_err(|error| error.into_dvr_error(text))?;
        Ok(Self {
            text: text.to_string(),
            root,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Non-boolean results are an error rather than truthy.
    pub fn evaluate(&self, bindings: &Bindings) -> DvrResult<bool> {
        self.root
            .evaluate(bindings)
            .and_then(|value| value.to_bool("predicate"))
            .map_err(|error| error.into_dvr_error(&self.text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePiece {
    Literal(String),
    Field {
        name: String,
        zero_pad: bool,
        width: usize,
    },
}

/// A `{name}` / `{name:02}` naming pattern, e.g. `jki_{jrot:02}{kmin}{ipar}f`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    text: String,
    pieces: Vec<TemplatePiece>,
}

impl NamingTemplate {
    pub fn compile(text: &str, variables: &[&str]) -> DvrResult<Self> {
        let pieces =
            parse_template(text, variables).map_err(|error| error.into_dvr_error(text))?;
        Ok(Self {
            text: text.to_string(),
            pieces,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn render(&self, bindings: &Bindings) -> DvrResult<String> {
        let mut rendered = String::new();
        for piece in &self.pieces {
            match piece {
                TemplatePiece::Literal(text) => rendered.push_str(text),
                TemplatePiece::Field {
                    name,
                    zero_pad,
                    width,
                } => {
                    let value = bindings.get(name).ok_or_else(|| {
                        ExpressionError::UnknownVariable { name: name.clone() }
                            .into_dvr_error(&self.text)
                    })?;
                    let field = match value {
                        Value::Int(number) if *zero_pad => {
                            format!("{number:0width$}", width = *width)
                        }
                        Value::Int(number) => format!("{number:>width$}", width = *width),
                        other => format!("{:<width$}", other.to_string(), width = *width),
                    };
                    rendered.push_str(&field);
                }
            }
        }
        Ok(rendered)
    }
}

fn parse_template(text: &str, variables: &[&str]) -> Result<Vec<TemplatePiece>, ExpressionError> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        let doubled = chars.peek().is_some_and(|(_, next)| *next == ch);
        match ch {
            '{' | '}' if doubled => {
                chars.next();
                literal.push(ch);
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    field.push(next);
                }
                if !closed {
                    return Err(ExpressionError::InvalidFormat {
                        field: text[offset..].to_string(),
                    });
                }
                if !literal.is_empty() {
                    pieces.push(TemplatePiece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(parse_field(&field, variables)?);
            }
            '}' => return Err(ExpressionError::UnexpectedChar { found: ch, offset }),
            _ => literal.push(ch),
        }
    }
    if !literal.is_empty() {
        pieces.push(TemplatePiece::Literal(literal));
    }
    Ok(pieces)
}

fn parse_field(field: &str, variables: &[&str]) -> Result<TemplatePiece, ExpressionError> {
    let (name, spec) = field.split_once(':').unwrap_or((field, ""));
    let name = name.trim();
    if !variables.contains(&name) {
        return Err(ExpressionError::UnknownVariable {
            name: name.to_string(),
        });
    }
    let invalid = || ExpressionError::InvalidFormat {
        field: field.to_string(),
    };
    let spec = spec.trim();
    let (zero_pad, digits) = match spec.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => (true, rest),
        _ => (false, spec),
    };
    let width = if digits.is_empty() {
        0
    } else {
        digits.parse::<usize>().map_err(|_| invalid())?
    };
    Ok(TemplatePiece::Field {
        name: name.to_string(),
        zero_pad,
        width,
    })
}

#[cfg(test)]
mod tests {
    use super::{Bindings, NamingTemplate, Predicate};
    use crate::domain::DvrErrorCategory;

    const TRANSITION_VARIABLES: [&str; 10] = [
        "jrot", "kmin", "ipar", "jrot_", "kmin_", "ipar_", "fort", "fort_", "name", "name_",
    ];

    fn transition(jrot: u32, ipar: u8, jrot_: u32, ipar_: u8) -> Bindings {
        Bindings::new()
            .with("jrot", jrot)
            .with("kmin", 0u8)
            .with("ipar", ipar)
            .with("jrot_", jrot_)
            .with("kmin_", 0u8)
            .with("ipar_", ipar_)
            .with("fort", "fort.26")
            .with("fort_", "fort.8")
            .with("name", "jki_0000f")
            .with("name_", "jki_0101f")
    }

    #[test]
    fn selection_rule_predicates_evaluate_over_pairs() {
        let rule = Predicate::compile(
            "ipar != ipar_ and abs(jrot - jrot_) <= 1 and fort_ == 'fort.8'",
            &TRANSITION_VARIABLES,
        )
        .expect("rule should compile");
        assert!(rule.evaluate(&transition(0, 0, 1, 1)).expect("bool"));
        assert!(!rule.evaluate(&transition(0, 0, 1, 0)).expect("bool"));
        assert!(!rule.evaluate(&transition(0, 0, 2, 1)).expect("bool"));

        let always = Predicate::compile("True", &TRANSITION_VARIABLES).expect("literal");
        assert!(always.evaluate(&transition(5, 1, 5, 1)).expect("bool"));
    }

    #[test]
    fn unknown_names_fail_at_compile_time() {
        let error = Predicate::compile("jrot == J", &TRANSITION_VARIABLES)
            .expect_err("J is not a variable");
        assert_eq!(error.category(), DvrErrorCategory::LookupError);
        assert!(error.message().contains("'J'"));

        let error = Predicate::compile("__import__('os')", &TRANSITION_VARIABLES)
            .expect_err("arbitrary calls are rejected");
        assert_eq!(error.category(), DvrErrorCategory::LookupError);
    }

    #[test]
    fn malformed_predicate_is_a_format_error() {
        let error = Predicate::compile("jrot ==", &TRANSITION_VARIABLES).expect_err("truncated");
        assert_eq!(error.category(), DvrErrorCategory::FormatError);
        assert!(error.message().contains("jrot =="));
    }

    #[test]
    fn non_boolean_result_is_a_type_error() {
        let rule = Predicate::compile("jrot + 1", &TRANSITION_VARIABLES).expect("compiles");
        let error = rule
            .evaluate(&transition(0, 0, 0, 0))
            .expect_err("integer result");
        assert_eq!(error.category(), DvrErrorCategory::TypeError);
    }

    #[test]
    fn naming_template_pads_integer_fields() {
        let template = NamingTemplate::compile("jki_{jrot:02}{kmin}{ipar}f", &["jrot", "kmin", "ipar"])
            .expect("template should compile");
        let bindings = Bindings::new().with("jrot", 7u32).with("kmin", 2u8).with("ipar", 1u8);
        assert_eq!(template.render(&bindings).expect("render"), "jki_0721f");

        let bindings = Bindings::new().with("jrot", 12u32).with("kmin", 0u8).with("ipar", 0u8);
        assert_eq!(template.render(&bindings).expect("render"), "jki_1200f");
    }

    #[test]
    fn naming_template_supports_escapes_and_widths() {
        let template =
            NamingTemplate::compile("{{J}}={jrot:3}|{kmin:03}", &["jrot", "kmin"]).expect("compile");
        let bindings = Bindings::new().with("jrot", 5u32).with("kmin", 1u8);
        assert_eq!(template.render(&bindings).expect("render"), "{J}=  5|001");
    }

    #[test]
    fn naming_template_rejects_bad_fields() {
        let error = NamingTemplate::compile("jki_{J}", &["jrot"]).expect_err("unknown field");
        assert_eq!(error.category(), DvrErrorCategory::LookupError);
        let error = NamingTemplate::compile("jki_{jrot:xx}", &["jrot"]).expect_err("bad spec");
        assert_eq!(error.category(), DvrErrorCategory::FormatError);
        let error = NamingTemplate::compile("jki_{jrot", &["jrot"]).expect_err("unterminated");
        assert_eq!(error.category(), DvrErrorCategory::FormatError);
    }
}
