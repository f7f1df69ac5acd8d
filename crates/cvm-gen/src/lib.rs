//! Code generator: walks a [`cvm_par::Ast`] plus its [`cvm_par::ScopeTree`]
//! and lowers it to a flat [`image::ExecutableImage`] of 32-bit words ready
//! for the virtual machine to load.
//!
//! Unlike the parser, this phase is not incremental: it needs the whole
//! tree's symbol table built (function addresses in particular aren't known
//! until every function has been emitted once), so it runs as one pass over
//! an already-complete [`cvm_par::ParseOutput`].

mod error;
mod generator;
mod image;

pub use error::CodegenError;
pub use generator::generate;
pub use image::{ExecutableImage, Opcode};
