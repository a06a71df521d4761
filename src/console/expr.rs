//! Operator expression language.
//!
//! `eval` and `setting` accept a small, closed expression grammar instead of
//! arbitrary code. Expressions read from a JSON scope (normally
//! [`ServerHandle::snapshot`](crate::server::ServerHandle::snapshot)) and
//! produce a [`serde_json::Value`].
//!
//! ```text
//! expr    := or
//! or      := and ( "||" and )*
//! and     := cmp ( "&&" cmp )*
//! cmp     := sum ( ( "==" | "!=" | "<" | "<=" | ">" | ">=" ) sum )?
//! sum     := product ( ( "+" | "-" ) product )*
//! product := unary ( ( "*" | "/" | "%" ) unary )*
//! unary   := ( "-" | "!" ) unary | primary
//! primary := number | string | "true" | "false" | "null" | path | "(" expr ")"
//! path    := ident ( "." segment )*
//! ```
//!
//! # Example
//!
//! ```
//! use cellhost::console::expr::evaluate;
//! use serde_json::json;
//!
//! let scope = json!({ "settings": { "server_frequency": 25 } });
//! let value = evaluate("settings.server_frequency * 2 >= 50", &scope).unwrap();
//! assert_eq!(value, json!(true));
//! ```

use serde_json::Value;
use thiserror::Error;

/// Largest integer a double holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Deepest nesting of parentheses and unary operators.
const MAX_DEPTH: usize = 128;

/// Longest token stream accepted; bounds the depth of operator chains.
const MAX_TOKENS: usize = 1024;

/// Failure to parse or evaluate an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("{0} is not defined")]
    Undefined(String),

    #[error("type error: {0}")]
    Type(String),
}

type ExprResult<T> = std::result::Result<T, ExprError>;

/// Parse and evaluate `source` against `scope`.
pub fn evaluate(source: &str, scope: &Value) -> ExprResult<Value> {
    let tokens = tokenize(source)?;
    if tokens.len() > MAX_TOKENS {
        return Err(ExprError::Syntax("expression too long".to_string()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(ExprError::Syntax(format!("unexpected {}", token)));
    }
    expr.eval(scope)
}

/// Render a value the way the console prints results: strings bare,
/// everything else as JSON.
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Value),
    Str(String),
    Ident(String),
    Dot,
    LParen,
    RParen,
    Op(&'static str),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::Ident(i) => write!(f, "'{}'", i),
            Token::Dot => write!(f, "'.'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Op(op) => write!(f, "'{}'", op),
        }
    }
}

const OPERATORS: [&str; 15] = [
    "==", "!=", "<=", ">=", "&&", "||", "<", ">", "+", "-", "*", "/", "%", "!", "=",
];

fn tokenize(source: &str) -> ExprResult<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Path segments after a dot may start with a digit: `worlds.1.stats`.
        if tokens.last() == Some(&Token::Dot) && is_ident_char(c) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let mut float = false;
            if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                float = true;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                float = true;
                i += 1;
                if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
                    i += 1;
                }
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = if float {
                text.parse::<f64>().ok().and_then(|f| number(f).ok())
            } else {
                text.parse::<i64>().ok().map(Value::from)
            };
            let value =
                value.ok_or_else(|| ExprError::Syntax(format!("invalid number {}", text)))?;
            tokens.push(Token::Number(value));
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            let mut s = String::new();
            i += 1;
            loop {
                let Some(&ch) = chars.get(i) else {
                    return Err(ExprError::Syntax("unterminated string".to_string()));
                };
                i += 1;
                match ch {
                    '\\' => {
                        let Some(&escaped) = chars.get(i) else {
                            return Err(ExprError::Syntax("unterminated string".to_string()));
                        };
                        i += 1;
                        s.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    }
                    ch if ch == quote => break,
                    ch => s.push(ch),
                }
            }
            tokens.push(Token::Str(s));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        match c {
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
                continue;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
                continue;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
                continue;
            }
            _ => {}
        }

        let rest: String = chars[i..chars.len().min(i + 2)].iter().collect();
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            return Err(ExprError::Syntax(format!("unexpected character '{}'", c)));
        };
        if *op == "=" {
            return Err(ExprError::Syntax("assignment is not supported".to_string()));
        }
        tokens.push(Token::Op(*op));
        i += op.len();
    }

    Ok(tokens)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Path(Vec<String>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        let op = match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => *op,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn expression(&mut self) -> ExprResult<Expr> {
        self.binary_level(0)
    }

    // Operator precedence levels, loosest first. Comparisons do not chain.
    fn binary_level(&mut self, level: usize) -> ExprResult<Expr> {
        const LEVELS: [&[&str]; 5] = [
            &["||"],
            &["&&"],
            &["==", "!=", "<", "<=", ">", ">="],
            &["+", "-"],
            &["*", "/", "%"],
        ];
        if level == LEVELS.len() {
            return self.unary();
        }

        let mut lhs = self.binary_level(level + 1)?;
        while let Some(op) = self.eat_op(LEVELS[level]) {
            let rhs = self.binary_level(level + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
            if level == 2 {
                break;
            }
        }
        Ok(lhs)
    }

    // Every level of parentheses or prefix operator passes through here.
    fn unary(&mut self) -> ExprResult<Expr> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::Syntax("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let expr = self.prefixed();
        self.depth -= 1;
        expr
    }

    fn prefixed(&mut self) -> ExprResult<Expr> {
        if self.eat_op(&["-"]).is_some() {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat_op(&["!"]).is_some() {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> ExprResult<Expr> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Literal(n)),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                _ => {
                    let mut path = vec![name];
                    while self.peek() == Some(&Token::Dot) {
                        self.pos += 1;
                        match self.next() {
                            Some(Token::Ident(segment)) => path.push(segment),
                            Some(other) => {
                                return Err(ExprError::Syntax(format!(
                                    "unexpected {} after '.'",
                                    other
                                )))
                            }
                            None => {
                                return Err(ExprError::Syntax(
                                    "unexpected end of input".to_string(),
                                ))
                            }
                        }
                    }
                    Ok(Expr::Path(path))
                }
            },
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(ExprError::Syntax(format!("expected ')', found {}", other))),
                    None => Err(ExprError::Syntax("expected ')'".to_string())),
                }
            }
            Some(other) => Err(ExprError::Syntax(format!("unexpected {}", other))),
            None => Err(ExprError::Syntax("unexpected end of input".to_string())),
        }
    }
}

impl Expr {
    fn eval(&self, scope: &Value) -> ExprResult<Value> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Path(path) => resolve(scope, path),
            Expr::Neg(inner) => {
                let v = inner.eval(scope)?;
                number(-as_number(&v, "-")?)
            }
            Expr::Not(inner) => Ok(Value::Bool(!truthy(&inner.eval(scope)?))),
            Expr::Binary("&&", lhs, rhs) => {
                Ok(Value::Bool(truthy(&lhs.eval(scope)?) && truthy(&rhs.eval(scope)?)))
            }
            Expr::Binary("||", lhs, rhs) => {
                Ok(Value::Bool(truthy(&lhs.eval(scope)?) || truthy(&rhs.eval(scope)?)))
            }
            Expr::Binary(op, lhs, rhs) => binary(op, &lhs.eval(scope)?, &rhs.eval(scope)?),
        }
    }
}

fn resolve(scope: &Value, path: &[String]) -> ExprResult<Value> {
    let mut current = scope;
    for (depth, segment) in path.iter().enumerate() {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| ExprError::Undefined(path[..=depth].join(".")))?;
    }
    Ok(current.clone())
}

fn binary(op: &str, lhs: &Value, rhs: &Value) -> ExprResult<Value> {
    match op {
        "+" => match (lhs, rhs) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", display(lhs), display(rhs))))
            }
            _ => number(as_number(lhs, op)? + as_number(rhs, op)?),
        },
        "-" => number(as_number(lhs, op)? - as_number(rhs, op)?),
        "*" => number(as_number(lhs, op)? * as_number(rhs, op)?),
        "/" | "%" => {
            let divisor = as_number(rhs, op)?;
            if divisor == 0.0 {
                return Err(ExprError::Type("division by zero".to_string()));
            }
            let dividend = as_number(lhs, op)?;
            number(if op == "/" {
                dividend / divisor
            } else {
                dividend % divisor
            })
        }
        "==" => Ok(Value::Bool(loose_eq(lhs, rhs))),
        "!=" => Ok(Value::Bool(!loose_eq(lhs, rhs))),
        "<" | "<=" | ">" | ">=" => {
            let ordering = match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => a
                    .as_f64()
                    .zip(b.as_f64())
                    .and_then(|(a, b)| a.partial_cmp(&b)),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            let Some(ordering) = ordering else {
                return Err(ExprError::Type(format!(
                    "cannot compare {} with {}",
                    type_name(lhs),
                    type_name(rhs)
                )));
            };
            Ok(Value::Bool(match op {
                "<" => ordering.is_lt(),
                "<=" => ordering.is_le(),
                ">" => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        other => Err(ExprError::Syntax(format!("unknown operator '{}'", other))),
    }
}

fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

fn as_number(value: &Value, op: &str) -> ExprResult<f64> {
    value.as_f64().ok_or_else(|| {
        ExprError::Type(format!("'{}' needs a number, got {}", op, type_name(value)))
    })
}

/// Wrap a float, keeping integral results as JSON integers.
fn number(f: f64) -> ExprResult<Value> {
    if !f.is_finite() {
        return Err(ExprError::Type("result is not a finite number".to_string()));
    }
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        return Ok(Value::from(f as i64));
    }
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| ExprError::Type("result is not a finite number".to_string()))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
