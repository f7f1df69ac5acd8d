//! Runtime errors: the only fatal conditions the dispatch loop can raise.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// `memory[ip]` decoded to no known [`crate::Opcode`]. Fatal, reports
    /// the instruction pointer at the moment of the failed fetch.
    #[error("unknown opcode {word} at ip={ip}")]
    UnknownOpcode { ip: usize, word: i32 },

    /// A memory access (stack push/pop, `LOAD`/`STORE`/`ARG`, or an
    /// in-image operand fetch) landed outside the machine's word array.
    /// The original implementation leaves this as undefined behaviour;
    /// this port always bounds-checks and turns it into a reportable error
    /// instead — see `DESIGN.md`.
    #[error("memory access out of bounds: address {address}")]
    OutOfBounds { address: i64 },

    /// `DIV` or `MOD`-shaped arithmetic with a zero divisor. The spec
    /// leaves this as host-defined undefined behaviour; native signed
    /// division by zero is a Rust panic, so this port reports it as a
    /// runtime error rather than letting the process abort.
    #[error("division by zero at ip={ip}")]
    DivisionByZero { ip: usize },

    /// The image passed to [`crate::VirtualMachine::load`] is longer than
    /// the machine's word array.
    #[error("image of {image_words} words does not fit in {mem_words}-word memory")]
    ImageTooLarge { image_words: usize, mem_words: usize },
}
