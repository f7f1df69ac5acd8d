//! Parse and name-resolution errors. Name resolution happens eagerly during
//! parsing, so an undefined or duplicate name is raised right here rather
//! than by a separate semantic pass.

use cvm_lex::Token;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected {expected}, found {found:?}")]
    Expected { expected: &'static str, found: Token },

    #[error("symbol not defined: {name:?} ({token:?})")]
    SymbolNotDefined { name: String, token: Token },

    #[error("already defined: {name:?} ({token:?})")]
    AlreadyDefined { name: String, token: Token },
}

impl ParseError {
    pub fn token(&self) -> &Token {
        match self {
            ParseError::Expected { found, .. } => found,
            ParseError::SymbolNotDefined { token, .. } => token,
            ParseError::AlreadyDefined { token, .. } => token,
        }
    }
}
