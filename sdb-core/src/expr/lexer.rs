//! Rule-table tokenizer
//!
//! Converts an expression string into tokens. Rules are tried in table
//! order and the first one matching at the current position wins, even if
//! a later rule would match a longer span, so the order doubles as
//! priority (hex before decimal, `==` before anything else starting with
//! `=`).

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

use super::error::LexError;
use super::token::{Token, TokenKind};
use crate::machine::Word;

/// What a rule produces when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Whitespace,
    Equal,
    NotEqual,
    And,
    Hex,
    Decimal,
    Register,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

struct Rule {
    pattern: Regex,
    kind: RuleKind,
}

const RULES: &[(&str, RuleKind)] = &[
    (r"[ \t]+", RuleKind::Whitespace),
    (r"==", RuleKind::Equal),
    (r"!=", RuleKind::NotEqual),
    (r"&&", RuleKind::And),
    (r"0[xX][0-9a-fA-F]+", RuleKind::Hex),
    (r"[0-9]+", RuleKind::Decimal),
    (r"\$[A-Za-z0-9_]+", RuleKind::Register),
    (r"\+", RuleKind::Plus),
    (r"-", RuleKind::Minus),
    (r"\*", RuleKind::Star),
    (r"/", RuleKind::Slash),
    (r"\(", RuleKind::LParen),
    (r"\)", RuleKind::RParen),
];

lazy_static! {
    // Compiled once; every pattern is anchored so a match is always at
    // offset zero of the remaining input.
    static ref COMPILED: Vec<Rule> = RULES
        .iter()
        .map(|(src, kind)| Rule {
            pattern: Regex::new(&format!("^(?:{})", src)).expect("lexer rule table is valid"),
            kind: *kind,
        })
        .collect();
}

/// Tokenize an expression
///
/// Stars are left as [`TokenKind::Star`]; call [`reclassify_dereference`]
/// before evaluation.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut position = 0;

    while position < input.len() {
        let rest = &input[position..];

        let (index, rule, text) = COMPILED
            .iter()
            .enumerate()
            .find_map(|(i, rule)| rule.pattern.find(rest).map(|m| (i, rule, m.as_str())))
            .ok_or(LexError::NoMatch { position })?;

        trace!(
            "match rules[{}] = \"{}\" at position {} with len {}: {}",
            index,
            RULES[index].0,
            position,
            text.len(),
            text
        );

        if let Some(kind) = token_kind(rule.kind, text, position)? {
            tokens.push(Token {
                kind,
                text: text.to_string(),
                position,
            });
        }

        position += text.len();
    }

    Ok(tokens)
}

/// Build the token kind for a rule match; `None` for discarded whitespace.
fn token_kind(rule: RuleKind, text: &str, position: usize) -> Result<Option<TokenKind>, LexError> {
    let out_of_range = || LexError::LiteralOutOfRange {
        position,
        text: text.to_string(),
    };

    let kind = match rule {
        RuleKind::Whitespace => return Ok(None),
        RuleKind::Hex => {
            TokenKind::Number(Word::from_str_radix(&text[2..], 16).map_err(|_| out_of_range())?)
        }
        RuleKind::Decimal => TokenKind::Number(text.parse().map_err(|_| out_of_range())?),
        RuleKind::Register => TokenKind::Register(text[1..].to_string()),
        RuleKind::Equal => TokenKind::Equal,
        RuleKind::NotEqual => TokenKind::NotEqual,
        RuleKind::And => TokenKind::And,
        RuleKind::Plus => TokenKind::Plus,
        RuleKind::Minus => TokenKind::Minus,
        RuleKind::Star => TokenKind::Star,
        RuleKind::Slash => TokenKind::Slash,
        RuleKind::LParen => TokenKind::LParen,
        RuleKind::RParen => TokenKind::RParen,
    };

    Ok(Some(kind))
}

/// Turn every prefix `*` into [`TokenKind::Dereference`]
///
/// A `*` is a dereference when it starts the expression or follows a token
/// that cannot end an operand (an operator or `(`).
pub fn reclassify_dereference(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        if tokens[i].kind != TokenKind::Star {
            continue;
        }
        let prefix = i == 0 || !tokens[i - 1].kind.ends_operand();
        if prefix {
            tokens[i].kind = TokenKind::Dereference;
        }
    }
}
