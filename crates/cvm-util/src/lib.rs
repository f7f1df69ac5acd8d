//! Foundation types shared by every phase of the cvm toolchain.
//!
//! `cvm-lex`, `cvm-par`, `cvm-gen`, and `cvm-vm` each own one phase of the
//! pipeline described in the top-level design (text → tokens → tree+scopes
//! → image → execution) and share nothing but the vocabulary defined here:
//! interned identifiers ([`Symbol`]), source locations ([`Span`]),
//! phase-agnostic diagnostics ([`Diagnostic`]), and a typed-index arena
//! ([`IndexVec`]) so a tree's `NodeId` can never be used to index a vector
//! of scopes by mistake.

mod diagnostic;
mod error;
mod index_vec;
mod span;
mod symbol;

pub use diagnostic::{Diagnostic, Level};
pub use error::IndexVecError;
pub use index_vec::{Idx, IndexVec};
pub use span::{Pos, Span};
pub use symbol::Symbol;

pub use rustc_hash::{FxHashMap, FxHashSet};
