//! Lexer error type.

use cvm_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A lexeme matched none of the structural/keyword/operator/literal
    /// validators.
    #[error("unknown token {text:?} at {span:?}")]
    UnknownToken { text: String, span: Span },

    /// A raw newline was seen inside an open string literal.
    #[error("newline in string literal at {span:?}")]
    NewlineInString { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnknownToken { span, .. } => *span,
            LexError::NewlineInString { span } => *span,
        }
    }
}
