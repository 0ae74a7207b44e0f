//! Token definitions for monitor expressions

use serde::{Deserialize, Serialize};

use crate::machine::Word;

/// A lexed token: its kind plus the source text it was matched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the token in the input
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Hex or decimal literal, already parsed
    Number(Word),
    /// Register name without the `$` sigil
    Register(String),

    Plus,     // +
    Minus,    // -
    Star,     // * (binary)
    Slash,    // /
    LParen,   // (
    RParen,   // )
    Equal,    // ==
    NotEqual, // !=
    And,      // &&

    /// Prefix `*`. Only produced by reclassifying a `Star`.
    Dereference,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Number(_) => "number",
            TokenKind::Register(_) => "register",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Equal => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::And => "&&",
            TokenKind::Dereference => "*",
        }
    }

    /// Whether a token of this kind can end an operand.
    ///
    /// A `*` following such a token is a multiplication; anywhere else it
    /// is a dereference.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_) | TokenKind::Register(_) | TokenKind::RParen
        )
    }

    /// Precedence class when used as the main operator of a range.
    ///
    /// Larger numbers bind more loosely. `None` for operands and parentheses.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            TokenKind::And => Some(5),
            TokenKind::Equal | TokenKind::NotEqual => Some(4),
            TokenKind::Plus | TokenKind::Minus => Some(3),
            TokenKind::Star | TokenKind::Slash => Some(2),
            TokenKind::Dereference => Some(1),
            _ => None,
        }
    }

    pub fn is_unary(&self) -> bool {
        matches!(self, TokenKind::Dereference)
    }
}
