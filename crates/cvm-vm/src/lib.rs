//! Virtual machine: a word-addressable memory and a fetch-decode-execute
//! dispatch loop over an [`cvm_gen::ExecutableImage`], under the x86-style
//! call-frame convention described in the top-level design (IP/SP/FP/LP
//! registers, three saved words per call, two host syscalls).
//!
//! This is the last phase of the pipeline: it takes an already-generated,
//! already-link-resolved image and only ever reads it, never walks the
//! tree or scope arenas the earlier phases built.

mod error;
mod vm;

pub use error::RuntimeError;
pub use vm::{CallStats, VirtualMachine, Word, DEFAULT_MEM_WORDS};
