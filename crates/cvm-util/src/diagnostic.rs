//! Diagnostic reporting.
//!
//! Each phase has its own fatal error kind. Each phase's own error type (see
//! `cvm-lex`, `cvm-par`, `cvm-gen`, `cvm-vm`) carries the structured detail
//! (offending token, reason, ...); this module supplies the shared,
//! printable [`Diagnostic`] shape the driver renders to the user,
//! independent of which phase raised it.

use crate::Span;
use std::fmt;

/// Severity of a diagnostic. The toolchain currently only ever emits
/// [`Level::Error`] (every phase failure is fatal), but `Note` lets a
/// diagnostic attach secondary context (e.g. "previous definition was here").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A single printable diagnostic, optionally anchored to a source location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        if let Some(span) = self.span {
            write!(f, " at {}", span.pos)?;
        }
        write!(f, ": {}", self.message)
    }
}
