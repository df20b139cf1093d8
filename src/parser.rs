//! Free-text answer parsing.
//!
//! Learners type answers like `8`, `x=5, y=3`, `x = -1.5` or `2 3`. This module
//! turns them into a [`ParsedAnswer`] map. Order of attempts:
//!
//! 1. a bare number (no `=`) short-circuits to `{x: value}`;
//! 2. `name=value` tokens separated by commas/whitespace;
//! 3. one or two positional numbers, read as `x` then `y`.
//!
//! The bare-number case must come first: many questions take a single scalar.

use tracing::debug;

use crate::domain::ParsedAnswer;
use crate::error::{EngineError, EngineResult};

/// Parse a learner's raw answer text.
pub fn parse(raw: &str) -> EngineResult<ParsedAnswer> {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return Err(EngineError::Format(raw.to_string()));
    }

    let mut out = ParsedAnswer::new();

    if !s.contains('=') {
        if let Some(n) = parse_number(&s) {
            out.insert("x".into(), n);
            return Ok(out);
        }
        let nums: Option<Vec<f64>> = split_tokens(&s).map(parse_number).collect();
        if let Some(nums) = nums.filter(|n| n.len() <= 2) {
            for (name, n) in ["x", "y"].iter().zip(nums) {
                out.insert((*name).to_string(), n);
            }
        }
    } else {
        let tight = tighten_equals(&s);
        for token in split_tokens(&tight) {
            let Some((name, value)) = token.split_once('=') else {
                continue;
            };
            let name = name.trim();
            match (is_variable_name(name), parse_number(value)) {
                (true, Some(n)) => {
                    out.insert(name.to_string(), n);
                }
                _ => debug!(target: "practice", token, "Discarding unreadable answer token"),
            }
        }
    }

    if out.is_empty() {
        Err(EngineError::Format(raw.to_string()))
    } else {
        Ok(out)
    }
}

/// Canonical text form of a parsed answer: `name=value, name=value`.
/// `parse(&format_answer(p)) == p` for any finite values.
pub fn format_answer(parsed: &ParsedAnswer) -> String {
    parsed
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn split_tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    // Rust accepts "inf"/"nan"; learners typing those are not giving a number.
    if !t.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    t.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_variable_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic())
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Drop whitespace around `=` so `x = 5` survives whitespace tokenizing.
fn tighten_equals(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            let mut run = String::from(c);
            while let Some(&n) = chars.peek() {
                if !n.is_whitespace() {
                    break;
                }
                run.push(n);
                chars.next();
            }
            let after_eq = out.ends_with('=');
            let before_eq = chars.peek() == Some(&'=');
            if !after_eq && !before_eq {
                out.push_str(&run);
            }
        } else {
            out.push(c);
        }
    }
    out
}
