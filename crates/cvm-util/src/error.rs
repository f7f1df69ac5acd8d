//! Error types shared at the boundary between phases.
//!
//! Each phase (`cvm-lex`, `cvm-par`, `cvm-gen`, `cvm-vm`) defines its own
//! `thiserror` enum for its own kind of failure; this module only holds the
//! pieces common to all of them.

use thiserror::Error;

/// Raised when a typed index vector is asked for a slot that isn't there.
/// Kept separate from the phase error enums because it signals an invariant
/// violation (a bug in this toolchain), not a user-facing compile error.
#[derive(Debug, Error)]
pub enum IndexVecError {
    #[error("index out of bounds: {index} (length {length})")]
    OutOfBounds { index: usize, length: usize },
}
