//! Parser: turns a token stream into an [`ast::Ast`] plus a [`scope::ScopeTree`]
//! of lexically resolved names.
//!
//! Name resolution happens eagerly, during parsing: every
//! declaration is entered into the current scope as it is parsed, and every
//! reference is looked up immediately, so there is no separate "resolve"
//! pass over a finished tree. A reference to a name that does not (yet)
//! exist anywhere in the enclosing scope chain is a [`error::ParseError`].
//! Whether a *resolved* symbol is being used in a way its kind allows — for
//! example, assigning to a function — is left to the generator to check.

mod ast;
mod error;
mod parser;
mod scope;

pub use ast::{Ast, BinOp, Node, NodeId, NodeKind, UnOp};
pub use error::ParseError;
pub use parser::{parse, ParseOutput};
pub use scope::{Scope, ScopeId, ScopeTree, Symbol, SymbolId, SymbolKind};
