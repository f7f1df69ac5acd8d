//! Code generation errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// No zero-argument FUNCTION named `main` exists in the root scope.
    #[error("no entry point: root scope has no 0-argument function named 'main'")]
    NoEntryPoint,

    /// A reference resolved by the parser names a symbol the generator
    /// cannot locate — this would indicate a parser/generator version
    /// mismatch, since the parser is supposed to guarantee resolution.
    #[error("unknown symbol referenced during code generation: {0:?}")]
    UnknownSymbol(String),

    /// A symbol is used in a position its kind does not allow: assigning to
    /// a non-variable, or calling a non-function.
    #[error("wrong-kind symbol '{name}': expected {expected}, found {found}")]
    WrongSymbolKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// `break` used outside of any enclosing `while`.
    #[error("break outside any while loop")]
    BreakOutsideLoop,

    /// An AST node had a shape the generator does not know how to lower —
    /// indicates a bug in the parser's tree construction, not a user error.
    #[error("malformed tree node: {0}")]
    MalformedNode(&'static str),
}
