use super::{Bindings, ExpressionError, Value};

const SYMBOLS: [&str; 17] = [
    "==", "!=", "<=", ">=", "//", "<", ">", "+", "-", "*", "/", "%", "(", ")", "[", "]", ",",
];

pub(super) const FUNCTIONS: [&str; 4] = ["abs", "min", "max", "len"];

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Int(i64),
    Str(String),
    Ident(String),
    Symbol(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

impl Token {
    fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Int(value) => value.to_string(),
            TokenKind::Str(text) => format!("'{text}'"),
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Symbol(symbol) => (*symbol).to_string(),
        }
    }

    fn unexpected(&self) -> ExpressionError {
        ExpressionError::UnexpectedToken {
            found: self.describe(),
            offset: self.offset,
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_ascii_digit() || ch.is_alphabetic() || ch == '_' {
            let mut end = offset;
            while let Some(&(index, next)) = chars.peek() {
                if !(next.is_alphanumeric() || next == '_') {
                    break;
                }
                end = index + next.len_utf8();
                chars.next();
            }
            let word = &text[offset..end];
            let kind = if ch.is_ascii_digit() {
                let value = word
                    .parse::<i64>()
                    .map_err(|_| ExpressionError::InvalidLiteral {
                        literal: word.to_string(),
                        offset,
                    })?;
                TokenKind::Int(value)
            } else {
                TokenKind::Ident(word.to_string())
            };
            tokens.push(Token { kind, offset });
            continue;
        }

        if ch == '\'' || ch == '"' {
            chars.next();
            let mut literal = String::new();
            let mut closed = false;
            for (_, next) in chars.by_ref() {
                if next == ch {
                    closed = true;
                    break;
                }
                literal.push(next);
            }
            if !closed {
                return Err(ExpressionError::UnterminatedString { offset });
            }
            tokens.push(Token {
                kind: TokenKind::Str(literal),
                offset,
            });
            continue;
        }

        let rest = &text[offset..];
        let symbol = SYMBOLS
            .iter()
            .copied()
            .find(|symbol| rest.starts_with(*symbol))
            .ok_or(ExpressionError::UnexpectedChar { found: ch, offset })?;
        for _ in 0..symbol.len() {
            chars.next();
        }
        tokens.push(Token {
            kind: TokenKind::Symbol(symbol),
            offset,
        });
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl ArithmeticOp {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "//",
            Self::Remainder => "%",
        }
    }

    fn apply(self, left: Value, right: Value) -> Result<Value, ExpressionError> {
        match (self, left, right) {
            (Self::Add, Value::Str(left), Value::Str(right)) => Ok(Value::Str(left + &right)),
            (Self::Divide | Self::Remainder, Value::Int(_), Value::Int(0)) => {
                Err(ExpressionError::DivisionByZero)
            }
            (op, Value::Int(left), Value::Int(right)) => {
                let result = match op {
                    Self::Add => left.checked_add(right),
                    Self::Subtract => left.checked_sub(right),
                    Self::Multiply => left.checked_mul(right),
                    Self::Divide => floor_div(left, right),
                    Self::Remainder => floor_rem(left, right),
                };
                result.map(Value::Int).ok_or(ExpressionError::Overflow {
                    operation: op.symbol(),
                })
            }
            (op, left, right) => Err(ExpressionError::TypeMismatch {
                operation: op.symbol(),
                left: left.type_name(),
                right: right.type_name(),
            }),
        }
    }
}

/// Integer division rounding toward negative infinity.
fn floor_div(left: i64, right: i64) -> Option<i64> {
    let quotient = left.checked_div(right)?;
    if left % right != 0 && ((left < 0) != (right < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

/// Remainder carrying the sign of the divisor.
fn floor_rem(left: i64, right: i64) -> Option<i64> {
    let remainder = left.checked_rem(right)?;
    if remainder != 0 && ((remainder < 0) != (right < 0)) {
        Some(remainder + right)
    } else {
        Some(remainder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
    NotIn,
}

impl CompareOp {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }

    fn apply(self, left: &Value, right: &Value) -> Result<bool, ExpressionError> {
        let ordering = match self {
            Self::Equal => return Ok(left == right),
            Self::NotEqual => return Ok(left != right),
            Self::In | Self::NotIn => {
                let contained = match (left, right) {
                    (item, Value::List(items)) => items.contains(item),
                    (Value::Str(needle), Value::Str(haystack)) => {
                        haystack.contains(needle.as_str())
                    }
                    _ => return Err(self.mismatch(left, right)),
                };
                return Ok(contained == (self == Self::In));
            }
            _ => match (left, right) {
                (Value::Int(left), Value::Int(right)) => left.cmp(right),
                (Value::Str(left), Value::Str(right)) => left.cmp(right),
                _ => return Err(self.mismatch(left, right)),
            },
        };
        Ok(match self {
            Self::Less => ordering.is_lt(),
            Self::LessEqual => ordering.is_le(),
            Self::Greater => ordering.is_gt(),
            _ => ordering.is_ge(),
        })
    }

    fn mismatch(self, left: &Value, right: &Value) -> ExpressionError {
        ExpressionError::TypeMismatch {
            operation: self.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Node {
    Literal(Value),
    Variable(String),
    List(Vec<Node>),
    Negate(Box<Node>),
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Arithmetic(ArithmeticOp, Box<Node>, Box<Node>),
    /// Chained comparison: `a < b <= c` holds when every adjacent pair holds.
    Compare(Box<Node>, Vec<(CompareOp, Node)>),
    Call(String, Vec<Node>),
}

impl Node {
    pub(super) fn evaluate(&self, bindings: &Bindings) -> Result<Value, ExpressionError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Variable(name) => {
                bindings
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ExpressionError::UnknownVariable { name: name.clone() })
            }
            Self::List(items) => items
                .iter()
                .map(|item| item.evaluate(bindings))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Self::Negate(inner) => match inner.evaluate(bindings)? {
                Value::Int(value) => value
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or(ExpressionError::Overflow { operation: "-" }),
                other => Err(ExpressionError::TypeMismatch {
                    operation: "-",
                    left: other.type_name(),
                    right: "nothing",
                }),
            },
            Self::Not(inner) => Ok(Value::Bool(!inner.evaluate(bindings)?.to_bool("not")?)),
            Self::And(left, right) => {
                if !left.evaluate(bindings)?.to_bool("and")? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(right.evaluate(bindings)?.to_bool("and")?))
            }
            Self::Or(left, right) => {
                if left.evaluate(bindings)?.to_bool("or")? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(right.evaluate(bindings)?.to_bool("or")?))
            }
            Self::Arithmetic(op, left, right) => {
                op.apply(left.evaluate(bindings)?, right.evaluate(bindings)?)
            }
            Self::Compare(first, rest) => {
                let mut left = first.evaluate(bindings)?;
                for (op, node) in rest {
                    let right = node.evaluate(bindings)?;
                    if !op.apply(&left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Self::Call(name, arguments) => {
                let arguments = arguments
                    .iter()
                    .map(|argument| argument.evaluate(bindings))
                    .collect::<Result<Vec<_>, _>>()?;
                call(name, arguments)
            }
        }
    }

    /// Every variable and function name referenced by the expression.
    pub(super) fn visit_names<'a>(
        &'a self,
        variables: &mut Vec<&'a str>,
        functions: &mut Vec<&'a str>,
    ) {
        match self {
            Self::Literal(_) => {}
            Self::Variable(name) => variables.push(name),
            Self::List(items) => {
                for item in items {
                    item.visit_names(variables, functions);
                }
            }
            Self::Negate(inner) | Self::Not(inner) => inner.visit_names(variables, functions),
            Self::And(left, right) | Self::Or(left, right) | Self::Arithmetic(_, left, right) => {
                left.visit_names(variables, functions);
                right.visit_names(variables, functions);
            }
            Self::Compare(first, rest) => {
                first.visit_names(variables, functions);
                for (_, node) in rest {
                    node.visit_names(variables, functions);
                }
            }
            Self::Call(name, arguments) => {
                functions.push(name);
                for argument in arguments {
                    argument.visit_names(variables, functions);
                }
            }
        }
    }
}

fn call(name: &str, arguments: Vec<Value>) -> Result<Value, ExpressionError> {
    let arity = |expected: &'static str| ExpressionError::WrongArity {
        function: name.to_string(),
        expected,
        actual: arguments.len(),
    };
    match name {
        "abs" => match arguments.as_slice() {
            [Value::Int(value)] => value
                .checked_abs()
                .map(Value::Int)
                .ok_or(ExpressionError::Overflow { operation: "abs" }),
            [other] => Err(ExpressionError::TypeMismatch {
                operation: "abs",
                left: other.type_name(),
                right: "nothing",
            }),
            _ => Err(arity("1")),
        },
        "len" => match arguments.as_slice() {
            [Value::Str(text)] => Ok(Value::Int(text.chars().count() as i64)),
            [Value::List(items)] => Ok(Value::Int(items.len() as i64)),
            [other] => Err(ExpressionError::TypeMismatch {
                operation: "len",
                left: other.type_name(),
                right: "nothing",
            }),
            _ => Err(arity("1")),
        },
        "min" | "max" => {
            if arguments.is_empty() {
                return Err(arity("at least 1"));
            }
            let mut best: Option<i64> = None;
            for argument in &arguments {
                let Value::Int(value) = argument else {
                    return Err(ExpressionError::TypeMismatch {
                        operation: if name == "min" { "min" } else { "max" },
                        left: argument.type_name(),
                        right: "integer",
                    });
                };
                best = Some(match best {
                    None => *value,
                    Some(current) if name == "min" => current.min(*value),
                    Some(current) => current.max(*value),
                });
            }
            Ok(Value::Int(best.unwrap_or_default()))
        }
        _ => Err(ExpressionError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

pub(super) fn parse(text: &str) -> Result<Node, ExpressionError> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        position: 0,
    };
    let node = parser.parse_or()?;
    match parser.peek() {
        Some(token) => Err(token.unexpected()),
        None => Ok(node),
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn symbol_at(&self, position: usize, symbol: &str) -> bool {
        matches!(
            self.tokens.get(position),
            Some(Token { kind: TokenKind::Symbol(found), .. }) if *found == symbol
        )
    }

    fn keyword_at(&self, position: usize, keyword: &str) -> bool {
        matches!(
            self.tokens.get(position),
            Some(Token { kind: TokenKind::Ident(found), .. }) if found == keyword
        )
    }

    fn eat_symbol(&mut self, symbol: &str) -> bool {
        let found = self.symbol_at(self.position, symbol);
        if found {
            self.position += 1;
        }
        found
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let found = self.keyword_at(self.position, keyword);
        if found {
            self.position += 1;
        }
        found
    }

    fn expect_symbol(&mut self, symbol: &str) -> Result<(), ExpressionError> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::Symbol(found),
                ..
            }) if found == symbol => Ok(()),
            Some(token) => Err(token.unexpected()),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn parse_or(&mut self) -> Result<Node, ExpressionError> {
        let mut node = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            node = Node::Or(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node, ExpressionError> {
        let mut node = self.parse_not()?;
        while self.eat_keyword("and") {
            let right = self.parse_not()?;
            node = Node::And(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_not(&mut self) -> Result<Node, ExpressionError> {
        if self.eat_keyword("not") {
            return Ok(Node::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, ExpressionError> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_operator() {
            rest.push((op, self.parse_additive()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Node::Compare(Box::new(first), rest))
        }
    }

    fn comparison_operator(&mut self) -> Option<CompareOp> {
        let (op, width) = match &self.peek()?.kind {
            TokenKind::Symbol("==") => (CompareOp::Equal, 1),
            TokenKind::Symbol("!=") => (CompareOp::NotEqual, 1),
            TokenKind::Symbol("<") => (CompareOp::Less, 1),
            TokenKind::Symbol("<=") => (CompareOp::LessEqual, 1),
            TokenKind::Symbol(">") => (CompareOp::Greater, 1),
            TokenKind::Symbol(">=") => (CompareOp::GreaterEqual, 1),
            TokenKind::Ident(name) if name == "in" => (CompareOp::In, 1),
            TokenKind::Ident(name)
                if name == "not" && self.keyword_at(self.position + 1, "in") =>
            {
                (CompareOp::NotIn, 2)
            }
            _ => return None,
        };
        self.position += width;
        Some(op)
    }

    fn parse_additive(&mut self) -> Result<Node, ExpressionError> {
        let mut node = self.parse_multiplicative()?;
        loop {
            let op = if self.eat_symbol("+") {
                ArithmeticOp::Add
            } else if self.eat_symbol("-") {
                ArithmeticOp::Subtract
            } else {
                return Ok(node);
            };
            let right = self.parse_multiplicative()?;
            node = Node::Arithmetic(op, Box::new(node), Box::new(right));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ExpressionError> {
        let mut node = self.parse_unary()?;
        loop {
            let op = if self.eat_symbol("*") {
                ArithmeticOp::Multiply
            } else if self.eat_symbol("//") || self.eat_symbol("/") {
                ArithmeticOp::Divide
            } else if self.eat_symbol("%") {
                ArithmeticOp::Remainder
            } else {
                return Ok(node);
            };
            let right = self.parse_unary()?;
            node = Node::Arithmetic(op, Box::new(node), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Node, ExpressionError> {
        if self.eat_symbol("-") {
            return Ok(Node::Negate(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, ExpressionError> {
        let token = self.advance().ok_or(ExpressionError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Int(value) => Ok(Node::Literal(Value::Int(value))),
            TokenKind::Str(text) => Ok(Node::Literal(Value::Str(text))),
            TokenKind::Ident(name) => {
                let literal = match name.as_str() {
                    "True" | "true" => Some(true),
                    "False" | "false" => Some(false),
                    _ => None,
                };
                if let Some(flag) = literal {
                    return Ok(Node::Literal(Value::Bool(flag)));
                }
                if matches!(name.as_str(), "and" | "or" | "not" | "in") {
                    return Err(ExpressionError::UnexpectedToken {
                        found: name,
                        offset: token.offset,
                    });
                }
                if self.eat_symbol("(") {
                    return Ok(Node::Call(name, self.parse_sequence(")")?));
                }
                Ok(Node::Variable(name))
            }
            TokenKind::Symbol("(") => {
                if self.eat_symbol(")") {
                    return Ok(Node::List(Vec::new()));
                }
                let first = self.parse_or()?;
                if self.eat_symbol(")") {
                    return Ok(first);
                }
                self.expect_symbol(",")?;
                let mut items = vec![first];
                items.extend(self.parse_sequence(")")?);
                Ok(Node::List(items))
            }
            TokenKind::Symbol("[") => Ok(Node::List(self.parse_sequence("]")?)),
            TokenKind::Symbol(symbol) => Err(ExpressionError::UnexpectedToken {
                found: symbol.to_string(),
                offset: token.offset,
            }),
        }
    }

    /// Comma-separated items up to `close`; a trailing comma is allowed.
    fn parse_sequence(&mut self, close: &str) -> Result<Vec<Node>, ExpressionError> {
        let mut items = Vec::new();
        loop {
            if self.eat_symbol(close) {
                return Ok(items);
            }
            items.push(self.parse_or()?);
            if !self.eat_symbol(",") {
                self.expect_symbol(close)?;
                return Ok(items);
            }
        }
    }
}
