//! Calculator tool: evaluates arithmetic found in a user utterance.
//!
//! Supports `+`, `-`, `*`, `/`, parentheses, decimal numbers and unary
//! negation. Input is tokenized, parsed by recursive descent into an
//! [`Expr`] tree, then evaluated. Nothing else is ever executed.

use parley_core::error::ToolError;
use parley_core::tool::ToolResult;
use regex_lite::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Trigger phrase followed by a run of expression characters.
static REQUEST_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:calculate|compute|what\s+is|what['’]s|how\s+much\s+is)\s*([0-9.+\-*/()\s]+)",
    )
    .ok()
});

/// Find an arithmetic request in an utterance and return its expression.
///
/// The captured run must hold at least one digit and one operator, so
/// "what is 42" or "what is the rum" are not calculations.
pub fn try_parse(utterance: &str) -> Option<String> {
    let pattern = REQUEST_PATTERN.as_ref()?;
    pattern.captures_iter(utterance).find_map(|caps| {
        let run = caps.get(1)?.as_str().trim();
        let has_digit = run.chars().any(|c| c.is_ascii_digit());
        let has_operator = run.chars().any(|c| matches!(c, '+' | '-' | '*' | '/'));
        (has_digit && has_operator).then(|| run.to_string())
    })
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

// ── Tokenizer ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' => { tokens.push(Token::Minus); i += 1; }
            '*' => { tokens.push(Token::Star); i += 1; }
            '/' => { tokens.push(Token::Slash); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let num: f64 = literal
                    .parse()
                    .map_err(|_| ToolError::Parse(format!("invalid number '{literal}'")))?;
                tokens.push(Token::Number(num));
            }
            c => return Err(ToolError::Unsupported(format!("character '{c}'"))),
        }
    }

    Ok(tokens)
}

// ── Parser ────────────────────────────────────────────────────────────────

/// Deepest nesting of parentheses and unary minus accepted.
const MAX_DEPTH: usize = 64;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn descend(&mut self) -> Result<(), ToolError> {
        if self.depth >= MAX_DEPTH {
            return Err(ToolError::Parse(format!(
                "expression nested deeper than {MAX_DEPTH} levels"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr, ToolError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.consume();
            left = Expr::binary(op, left, self.parse_term()?);
        }
        Ok(left)
    }

    // term = unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<Expr, ToolError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.consume();
            left = Expr::binary(op, left, self.parse_unary()?);
        }
        Ok(left)
    }

    // unary = '-' unary | primary
    fn parse_unary(&mut self) -> Result<Expr, ToolError> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    // primary = NUMBER | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Expr, ToolError> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_expr()?;
                self.depth -= 1;
                match self.consume() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ToolError::Parse("expected closing parenthesis".into())),
                }
            }
            Some(tok) => Err(ToolError::Parse(format!("unexpected token {tok:?}"))),
            None => Err(ToolError::Parse("unexpected end of expression".into())),
        }
    }
}

/// Parse an expression into a tree without evaluating it.
pub fn parse(input: &str) -> Result<Expr, ToolError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ToolError::Parse("empty expression".into()));
    }

    let mut parser = Parser::new(&tokens);
    let expr = parser.parse_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(ToolError::Parse(format!(
            "unexpected token {tok:?} at position {}",
            parser.pos
        )));
    }
    Ok(expr)
}

/// Evaluate a parsed tree.
pub fn eval(expr: &Expr) -> Result<f64, ToolError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Neg(inner) => Ok(-eval(inner)?),
        Expr::Binary { op, lhs, rhs } => {
            let l = eval(lhs)?;
            let r = eval(rhs)?;
            match op {
                BinOp::Add => Ok(l + r),
                BinOp::Sub => Ok(l - r),
                BinOp::Mul => Ok(l * r),
                BinOp::Div if r == 0.0 => Err(ToolError::DivisionByZero),
                BinOp::Div => Ok(l / r),
            }
        }
    }
}

/// Evaluate an arithmetic expression string.
pub fn evaluate(input: &str) -> Result<f64, ToolError> {
    let value = eval(&parse(input)?)?;
    if !value.is_finite() {
        return Err(ToolError::Parse("result is out of range".into()));
    }
    Ok(value)
}

/// Evaluate and package the outcome for the persona engine.
pub fn invoke(expression: &str) -> ToolResult {
    let value = evaluate(expression);
    debug!(expression, ok = value.is_ok(), "Calculator invoked");
    ToolResult {
        expression: expression.to_string(),
        value,
    }
}

/// Format a value for display: integers without a fraction, everything
/// else rounded to six decimals with trailing zeros removed.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{value:.6}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".into()
    } else {
        trimmed.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
