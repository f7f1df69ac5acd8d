//! The driver's own error type: a thin, uniform wrapper around whichever
//! phase failed. `anyhow` handles I/O-boundary failures (reading the source
//! file, reading a config file); this type is for the four structured phase
//! errors the spec's error-handling design names.

use cvm_util::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Lex(#[from] cvm_lex::LexError),

    #[error(transparent)]
    Parse(#[from] cvm_par::ParseError),

    #[error(transparent)]
    Codegen(#[from] cvm_gen::CodegenError),

    #[error(transparent)]
    Runtime(#[from] cvm_vm::RuntimeError),
}

impl DriverError {
    /// Build the printable [`Diagnostic`] for this error, anchored to a
    /// source location where the phase that raised it tracks one.
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            DriverError::Lex(e) => Diagnostic::error(e.to_string()).with_span(e.span()),
            DriverError::Parse(e) => Diagnostic::error(e.to_string()).with_span(e.token().span),
            DriverError::Codegen(e) => Diagnostic::error(e.to_string()),
            DriverError::Runtime(e) => Diagnostic::error(e.to_string()),
        }
    }
}
