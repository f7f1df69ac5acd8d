//! The executable image: a flat array of 32-bit words the generator fills
//! in and the virtual machine later loads verbatim into memory starting at
//! word 0.
//!
//! Opcodes and their in-stream operands share one word size with data, the
//! same way the original stack machine's bytecode does — there is no
//! separate "operand pool"; `CALL a, n` simply occupies three consecutive
//! words (opcode, `a`, `n`).

use std::fmt;

/// One instruction mnemonic. Variants are listed in the same grouping as
/// the instruction-set table: stack, arithmetic, bitwise, control,
/// comparison, logic, call, locals.
///
/// Several variants (`PUSH`/`POP`, `INC`/`DEC`, the `IFNE`/`IFGR`/`IFGE`/
/// `IFLS`/`IFLE` family) are never emitted by this generator — only
/// `IFZERO` comes out of high-level `if`/`while` lowering — but they are
/// real, dispatchable opcodes the virtual machine must still decode, so
/// they live here rather than in a "generator-only" subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Opcode {
    Const = 0,
    Push = 1,
    Pop = 2,
    Dup = 3,
    Drop = 4,
    Inc = 5,
    Dec = 6,
    Add = 7,
    Sub = 8,
    Mul = 9,
    Div = 10,
    And = 11,
    Or = 12,
    Xor = 13,
    Shl = 14,
    Shr = 15,
    Not = 16,
    Jmp = 17,
    IfZero = 18,
    IfNe = 19,
    IfGr = 20,
    IfGe = 21,
    IfLs = 22,
    IfLe = 23,
    Eq = 24,
    NEqual = 25,
    Greater = 26,
    GrEqual = 27,
    Less = 28,
    LsEqual = 29,
    LAnd = 30,
    LOr = 31,
    LNot = 32,
    Call = 33,
    Ret = 34,
    Syscall = 35,
    Halt = 36,
    Load = 37,
    Store = 38,
    Arg = 39,
}

impl Opcode {
    /// Reconstruct an opcode from the word it was encoded as. Used only by
    /// the virtual machine's fetch step; the generator only ever goes the
    /// other direction (`Opcode` -> `i32`).
    pub fn from_word(word: i32) -> Option<Opcode> {
        use Opcode::*;
        Some(match word {
            0 => Const,
            1 => Push,
            2 => Pop,
            3 => Dup,
            4 => Drop,
            5 => Inc,
            6 => Dec,
            7 => Add,
            8 => Sub,
            9 => Mul,
            10 => Div,
            11 => And,
            12 => Or,
            13 => Xor,
            14 => Shl,
            15 => Shr,
            16 => Not,
            17 => Jmp,
            18 => IfZero,
            19 => IfNe,
            20 => IfGr,
            21 => IfGe,
            22 => IfLs,
            23 => IfLe,
            24 => Eq,
            25 => NEqual,
            26 => Greater,
            27 => GrEqual,
            28 => Less,
            29 => LsEqual,
            30 => LAnd,
            31 => LOr,
            32 => LNot,
            33 => Call,
            34 => Ret,
            35 => Syscall,
            36 => Halt,
            37 => Load,
            38 => Store,
            39 => Arg,
            _ => return None,
        })
    }
}

impl From<Opcode> for i32 {
    fn from(op: Opcode) -> i32 {
        op as i32
    }
}

/// A growable word buffer plus an emit cursor.
///
/// Functions, `if`/`else` branches, and `while` bodies are each generated
/// into their own scratch `ExecutableImage` first (so the generator knows
/// their exact word length before it has to compute a jump distance), then
/// spliced onto the image they belong in.
#[derive(Clone, Debug, Default)]
pub struct ExecutableImage {
    words: Vec<i32>,
}

impl ExecutableImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next `emit_word` call will write to.
    pub fn position(&self) -> usize {
        self.words.len()
    }

    pub fn words(&self) -> &[i32] {
        &self.words
    }

    /// Append one raw word, returning the index it landed at.
    pub fn emit_word(&mut self, word: i32) -> usize {
        let at = self.words.len();
        self.words.push(word);
        at
    }

    /// Append an opcode's word encoding.
    pub fn emit_opcode(&mut self, op: Opcode) -> usize {
        self.emit_word(op.into())
    }

    /// Overwrite the word at `index` with `value`. Panics if out of bounds —
    /// every caller patches an index it emitted itself earlier in the same
    /// image.
    pub fn patch(&mut self, index: usize, value: i32) {
        self.words[index] = value;
    }

    /// Append every word of `other` onto this image.
    pub fn splice(&mut self, other: &ExecutableImage) {
        self.words.extend_from_slice(&other.words);
    }

    pub fn last_word(&self) -> Option<i32> {
        self.words.last().copied()
    }

    /// Render one word per line as `addr: decimal` for debugging/`--dump-disasm`.
    /// This is a raw word dump, not a real disassembler — it does not know
    /// which words are operands versus opcodes.
    pub fn dump_words(&self) -> String {
        use fmt::Write;
        let mut out = String::new();
        for (addr, word) in self.words.iter().enumerate() {
            let _ = writeln!(out, "{addr:>5}: {word}");
        }
        out
    }
}
