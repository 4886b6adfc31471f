//! Client-side entity filter
//!
//! A small predicate language evaluated against entity attributes after the
//! property-scoped fetch:
//!
//! - `field eq value` / `field ne value`
//! - `field in (value, value, ...)`
//! - clauses joined with `and`
//!
//! Values are `true`, `false`, `null`, `'quoted text'` (with `''` as an
//! escaped quote) or a bare word. Text compares ASCII case-insensitively,
//! array attributes match when any element matches, and a missing attribute
//! only equals `null`. Nested attributes use `/`, e.g.
//! `signInActivity/lastSignInDateTime eq null`.

use crate::entity::{lookup_path, SourceEntity};
use crate::error::{CoreError, CoreResult};
use serde_json::Value;
use std::fmt;

/// Literal on the right-hand side of a clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Null,
    Bool(bool),
    Text(String),
}

/// Comparison operator with its operand(s)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Eq(Literal),
    Ne(Literal),
    In(Vec<Literal>),
}

/// One `field <op> value` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: String,
    pub comparison: Comparison,
}

/// Conjunction of clauses; the empty filter matches every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    clauses: Vec<Clause>,
}

impl EntityFilter {
    /// Filter that accepts everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a filter expression. Blank input yields [`EntityFilter::all`].
    pub fn parse(expression: &str) -> CoreResult<Self> {
        let tokens = tokenize(expression)?;
        Parser {
            expression,
            tokens,
            pos: 0,
        }
        .parse()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the filter against an entity's attributes.
    pub fn matches(&self, entity: &SourceEntity) -> bool {
        self.clauses.iter().all(|clause| {
            let value = lookup_path(&entity.attributes, &clause.field);
            match &clause.comparison {
                Comparison::Eq(lit) => literal_matches(lit, value),
                Comparison::Ne(lit) => !literal_matches(lit, value),
                Comparison::In(lits) => lits.iter().any(|lit| literal_matches(lit, value)),
            }
        })
    }
}

fn literal_matches(literal: &Literal, value: Option<&Value>) -> bool {
    match (literal, value) {
        (Literal::Null, None | Some(Value::Null)) => true,
        (_, None | Some(Value::Null)) => false,
        (lit, Some(Value::Array(items))) => items.iter().any(|item| literal_matches(lit, Some(item))),
        (Literal::Null, Some(_)) => false,
        (Literal::Bool(expected), Some(Value::Bool(actual))) => expected == actual,
        (Literal::Bool(expected), Some(Value::String(s))) => {
            s.eq_ignore_ascii_case(if *expected { "true" } else { "false" })
        }
        (Literal::Bool(_), Some(_)) => false,
        (Literal::Text(expected), Some(Value::String(s))) => s.eq_ignore_ascii_case(expected),
        (Literal::Text(expected), Some(Value::Bool(b))) => {
            expected.eq_ignore_ascii_case(if *b { "true" } else { "false" })
        }
        (Literal::Text(expected), Some(Value::Number(n))) => n.to_string() == *expected,
        (Literal::Text(_), Some(Value::Object(_))) => false,
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl fmt::Display for EntityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " and ")?;
            }
            match &clause.comparison {
                Comparison::Eq(lit) => write!(f, "{} eq {}", clause.field, lit)?,
                Comparison::Ne(lit) => write!(f, "{} ne {}", clause.field, lit)?,
                Comparison::In(lits) => {
                    let parts: Vec<String> = lits.iter().map(|l| l.to_string()).collect();
                    write!(f, "{} in ({})", clause.field, parts.join(", "))?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
    Open,
    Close,
    Comma,
}

fn tokenize(expression: &str) -> CoreResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            text.push('\'');
                        }
                        Some('\'') => break,
                        Some(other) => text.push(other),
                        None => {
                            return Err(CoreError::InvalidFilter {
                                expression: expression.to_string(),
                                reason: "unterminated quoted value".to_string(),
                            })
                        }
                    }
                }
                tokens.push(Token::Quoted(text));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | ',' | '\'') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn parse(mut self) -> CoreResult<EntityFilter> {
        let mut clauses = Vec::new();
        if self.tokens.is_empty() {
            return Ok(EntityFilter { clauses });
        }

        loop {
            clauses.push(self.clause()?);
            match self.next() {
                None => break,
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("and") => continue,
                Some(other) => return Err(self.error(format!("expected 'and', found {:?}", other))),
            }
        }

        Ok(EntityFilter { clauses })
    }

    fn clause(&mut self) -> CoreResult<Clause> {
        let field = match self.next() {
            Some(Token::Word(w)) => w,
            other => return Err(self.error(format!("expected a field name, found {:?}", other))),
        };

        let op = match self.next() {
            Some(Token::Word(w)) => w.to_ascii_lowercase(),
            other => {
                return Err(self.error(format!(
                    "expected an operator after '{}', found {:?}",
                    field, other
                )))
            }
        };

        let comparison = match op.as_str() {
            "eq" => Comparison::Eq(self.literal()?),
            "ne" => Comparison::Ne(self.literal()?),
            "in" => Comparison::In(self.literal_list()?),
            _ => {
                return Err(self.error(format!(
                    "unknown operator '{}', expected eq, ne or in",
                    op
                )))
            }
        };

        Ok(Clause { field, comparison })
    }

    fn literal(&mut self) -> CoreResult<Literal> {
        match self.next() {
            Some(Token::Quoted(text)) => Ok(Literal::Text(text)),
            Some(Token::Word(w)) => Ok(match w.to_ascii_lowercase().as_str() {
                "true" => Literal::Bool(true),
                "false" => Literal::Bool(false),
                "null" => Literal::Null,
                _ => Literal::Text(w),
            }),
            other => Err(self.error(format!("expected a value, found {:?}", other))),
        }
    }

    fn literal_list(&mut self) -> CoreResult<Vec<Literal>> {
        if self.next() != Some(Token::Open) {
            return Err(self.error("expected '(' after 'in'".to_string()));
        }
        let mut literals = vec![self.literal()?];
        loop {
            match self.next() {
                Some(Token::Comma) => literals.push(self.literal()?),
                Some(Token::Close) => return Ok(literals),
                other => {
                    return Err(self.error(format!("expected ',' or ')', found {:?}", other)))
                }
            }
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn error(&self, reason: String) -> CoreError {
        CoreError::InvalidFilter {
            expression: self.expression.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
