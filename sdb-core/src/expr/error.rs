//! Expression error types

use thiserror::Error;

use crate::machine::{BadAddress, UndefinedRegister, Word};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("No token matches at position {position}")]
    NoMatch { position: usize },

    #[error("Literal '{text}' at position {position} does not fit in a machine word")]
    LiteralOutOfRange { position: usize, text: String },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::NoMatch { position } | LexError::LiteralOutOfRange { position, .. } => {
                *position
            }
        }
    }

    /// The input with a caret under the offending column:
    ///
    /// ```text
    /// 1 + @
    ///     ^
    /// ```
    pub fn caret_line(&self, input: &str) -> String {
        let column = input
            .get(..self.position())
            .map_or(self.position(), |prefix| prefix.chars().count());
        format!("{}\n{}^", input, " ".repeat(column))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    // Lexing errors
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Expression has {count} tokens, the limit is {limit}")]
    TooManyTokens { count: usize, limit: usize },

    // Structural errors
    #[error("Missing operand before token {position}")]
    EmptyOperand { position: usize },

    #[error("Unmatched parenthesis at token {position}")]
    UnmatchedParentheses { position: usize },

    #[error("Missing operator at token {position}")]
    MissingOperator { position: usize },

    #[error("'{token}' is not a value")]
    NotAValue { token: String },

    // Machine errors
    #[error("Undefined register: '${name}'")]
    UndefinedRegister { name: String },

    #[error("Cannot read memory at 0x{address:08x}")]
    BadAddress { address: Word },

    // Arithmetic errors
    #[error("Division by zero")]
    DivisionByZero,
}

impl From<UndefinedRegister> for EvalError {
    fn from(err: UndefinedRegister) -> Self {
        EvalError::UndefinedRegister { name: err.name }
    }
}

impl From<BadAddress> for EvalError {
    fn from(err: BadAddress) -> Self {
        EvalError::BadAddress {
            address: err.address,
        }
    }
}
