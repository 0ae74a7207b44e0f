//! Expression evaluation module
//!
//! Tokenizes and evaluates monitor expressions such as `$sp + 4`,
//! `*0x80000000 == 0x13` or `($a0 - 1) * 2`.

pub mod error;
pub mod eval;
pub mod lexer;
pub mod token;

pub use error::{EvalError, LexError};
pub use eval::{evaluate, Evaluator};
pub use lexer::{reclassify_dereference, tokenize};
pub use token::{Token, TokenKind};

use crate::machine::{MemoryReader, RegisterLookup, Word};

/// Tokenize and evaluate an expression in one step
///
/// This is the entry point for `p`/`x`/`w`-style commands. Expressions with
/// more than `max_tokens` tokens are rejected before evaluation.
pub fn tokenize_and_evaluate<R, M>(
    input: &str,
    registers: R,
    memory: M,
    max_tokens: usize,
) -> Result<Word, EvalError>
where
    R: RegisterLookup,
    M: MemoryReader,
{
    let tokens = prepare(input, max_tokens)?;
    evaluate(&tokens, registers, memory)
}

/// Tokenize, enforce the token limit and reclassify dereferences
pub fn prepare(input: &str, max_tokens: usize) -> Result<Vec<Token>, EvalError> {
    let mut tokens = tokenize(input)?;
    if tokens.len() > max_tokens {
        return Err(EvalError::TooManyTokens {
            count: tokens.len(),
            limit: max_tokens,
        });
    }
    reclassify_dereference(&mut tokens);
    Ok(tokens)
}
