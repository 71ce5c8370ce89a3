//! Tokenizer for SVG path data.
//!
//! Scans raw text into command letters and numeric literals. Whitespace and
//! commas are interchangeable separators, and adjacent literals need no
//! separator at all: `"1.5.5"` is `1.5` then `.5`, `"10-5"` is `10` then `-5`.
//!
//! The tokenizer is pull-based so the interpreter can ask for an arc flag
//! (a single `0`/`1` character) where a general number would over-read,
//! as in the compact form `a1 1 0 0110 10`.

use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, opt};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::one_of;

/// Every command letter the interpreter understands.
const COMMAND_LETTERS: &str = "MmLlHhVvCcSsQqTtAaZz";

/// A lexical unit of path data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathToken {
    /// One of `M L H V C S Q T A Z` in either case.
    Command(char),
    /// A letter that is not a path command. Its arguments are discarded.
    Unknown(char),
    Number(f64),
}

/// Read one numeric literal from the front of `input`.
///
/// Grammar: `[+-]? (digits ('.' digits?)? | '.' digits) ([eE] [+-]? digits)?`.
/// An exponent marker not followed by digits is left in the input. On
/// failure the input is not advanced.
pub fn read_number(input: &mut &str) -> Option<f64> {
    let start = *input;
    let literal: ModalResult<&str, ContextError> = (
        opt(one_of(['+', '-'])),
        alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void())),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input);

    match literal.ok().and_then(|s| s.parse::<f64>().ok()) {
        Some(value) if value.is_finite() => Some(value),
        _ => {
            *input = start;
            None
        }
    }
}

/// Whether `c` can begin a numeric literal.
fn starts_number(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '.')
}

fn is_separator(c: char) -> bool {
    c.is_ascii_whitespace() || c == ','
}

/// Pull-based scanner over path data.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    /// Unconsumed input.
    pub fn remaining(&self) -> &'a str {
        self.rest
    }

    pub fn is_at_end(&mut self) -> bool {
        self.skip_separators();
        self.rest.is_empty()
    }

    fn skip_separators(&mut self) {
        self.rest = self.rest.trim_start_matches(is_separator);
    }

    pub(crate) fn peek(&mut self) -> Option<char> {
        self.skip_separators();
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.rest.chars().next()?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    /// Whether the next token looks like a number (without consuming it).
    pub fn at_number(&mut self) -> bool {
        self.peek().is_some_and(starts_number)
    }

    /// Read a number if one is next; otherwise leave the input untouched.
    pub fn next_number(&mut self) -> Option<f64> {
        self.skip_separators();
        read_number(&mut self.rest)
    }

    /// Read an arc flag: exactly one `0` or `1` character.
    pub fn next_flag(&mut self) -> Option<bool> {
        match self.peek()? {
            '0' => {
                self.bump();
                Some(false)
            }
            '1' => {
                self.bump();
                Some(true)
            }
            _ => None,
        }
    }

    /// Drop one character that cannot start any token.
    pub(crate) fn skip_malformed(&mut self) {
        if let Some(c) = self.bump() {
            log::debug!("path data: skipping malformed character {c:?}");
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = PathToken;

    fn next(&mut self) -> Option<PathToken> {
        loop {
            let c = self.peek()?;
            if c.is_ascii_alphabetic() {
                self.bump();
                return Some(if COMMAND_LETTERS.contains(c) {
                    PathToken::Command(c)
                } else {
                    PathToken::Unknown(c)
                });
            }
            if starts_number(c)
                && let Some(n) = self.next_number()
            {
                return Some(PathToken::Number(n));
            }
            self.skip_malformed();
        }
    }
}
