//! Tokenizer and recursive-descent parser.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/' | '//') factor)*
//! factor := ('+' | '-') factor | power
//! power  := atom ('**' factor)?
//! atom   := NUMBER | '(' expr ')'
//! ```
//!
//! `factor` nests at most [`MAX_DEPTH`] deep.

use super::Number;
use crate::error::{EvalError, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    LParen,
    RParen,
}

impl Token {
    fn describe(self) -> String {
        match self {
            Self::Num(n) => format!("number {n}"),
            Self::Plus => "'+'".into(),
            Self::Minus => "'-'".into(),
            Self::Star => "'*'".into(),
            Self::DoubleStar => "'**'".into(),
            Self::Slash => "'/'".into(),
            Self::DoubleSlash => "'//'".into(),
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let mut is_float = false;
                if i < chars.len() && chars[i] == '.' {
                    is_float = true;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_literal(&literal, is_float)?));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' | '/' => {
                let doubled = chars.get(i + 1) == Some(&c);
                tokens.push(match (c, doubled) {
                    ('*', false) => Token::Star,
                    ('*', true) => Token::DoubleStar,
                    ('/', false) => Token::Slash,
                    _ => Token::DoubleSlash,
                });
                i += if doubled { 2 } else { 1 };
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => return Err(EvalError::InvalidCharacter(other)),
        }
    }

    Ok(tokens)
}

fn parse_literal(literal: &str, is_float: bool) -> Result<Number> {
    if literal == "." {
        return Err(EvalError::Syntax("unexpected '.'".into()));
    }

    if is_float {
        return literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|e| EvalError::Syntax(format!("bad number '{literal}': {e}")));
    }

    if literal.len() > 1 && literal.starts_with('0') && literal.chars().any(|c| c != '0') {
        return Err(EvalError::LeadingZeros);
    }

    literal
        .parse::<i128>()
        .map(Number::Int)
        .map_err(|_| EvalError::IntegerOverflow)
}

/// Deepest nesting of parentheses, unary signs and exponents
pub const MAX_DEPTH: usize = 200;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Number> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus {
                value.checked_add(rhs)?
            } else {
                value.checked_sub(rhs)?
            };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<Number> {
        let mut value = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::DoubleSlash)) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = match op {
                Token::Star => value.checked_mul(rhs)?,
                Token::Slash => value.true_div(rhs)?,
                _ => value.floor_div(rhs)?,
            };
        }
        Ok(value)
    }

    /// Every recursive path passes through here, so this bounds the stack
    fn factor(&mut self) -> Result<Number> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<Number> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.factor()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                self.factor()?.checked_neg()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Number> {
        let base = self.atom()?;
        if self.peek() == Some(Token::DoubleStar) {
            self.pos += 1;
            let exponent = self.factor()?;
            return base.pow(exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    None => Err(EvalError::UnclosedParen),
                    Some(other) => Err(EvalError::Syntax(format!(
                        "unexpected {}",
                        other.describe()
                    ))),
                }
            }
            Some(Token::RParen) => Err(EvalError::UnmatchedParen),
            Some(other) => Err(EvalError::Syntax(format!("unexpected {}", other.describe()))),
            None => Err(EvalError::Syntax("unexpected end of expression".into())),
        }
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(input: &str) -> Result<Number> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::Syntax("empty expression".into()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;

    match parser.next() {
        None => Ok(value),
        Some(Token::RParen) => Err(EvalError::UnmatchedParen),
        Some(other) => Err(EvalError::Syntax(format!("unexpected {}", other.describe()))),
    }
}
