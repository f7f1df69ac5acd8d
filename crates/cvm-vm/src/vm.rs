//! The stack machine proper: a flat word array, four registers, and a
//! fetch-decode-execute loop.
//!
//! Every register and every address is one [`Word`] (`i32`), per the data
//! model: this is a word-addressable machine, there is no separate byte
//! address space. `OP_CALL`/`OP_RET`'s register save/restore order and the
//! relative-jump convention (an operand is added to the address of the
//! operand word itself, before `ip` has advanced past it) are carried over
//! unchanged from the original dispatch loop.

use std::io::Write;

use cvm_gen::{ExecutableImage, Opcode};
use tracing::trace;

use crate::error::RuntimeError;

/// The atomic storage/addressing unit: a signed 32-bit word.
pub type Word = i32;

/// Default word count when a caller doesn't care — generous enough for the
/// toy programs this toolchain compiles, without the byte/word unit
/// confusion the original's byte-sized default invited (see `DESIGN.md`).
pub const DEFAULT_MEM_WORDS: usize = 16384;

/// Host-visible effects of the two specified syscalls. `0x20` resolves a
/// word address to a nul-terminated byte string (one byte per word, low
/// byte only — see [`VirtualMachine::syscall`]); `0x21` is a signed decimal
/// integer followed by a newline.
type Host<'a> = dyn Write + 'a;

/// Counts of `CALL`/`RET` instructions retired, for Testable Property 6
/// (call/return balance).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallStats {
    pub calls: u64,
    pub returns: u64,
}

/// A word-addressable memory array plus IP/SP/FP/LP registers.
///
/// [`VirtualMachine::load`] copies an [`ExecutableImage`] in starting at
/// word 0; [`VirtualMachine::run`] boots the standard register layout and
/// dispatches until `HALT` or a [`RuntimeError`].
pub struct VirtualMachine {
    memory: Vec<Word>,
    ip: Word,
    sp: Word,
    fp: Word,
    lp: Word,
    stats: CallStats,
}

impl VirtualMachine {
    /// Allocate `mem_words` words of RAM, zeroed.
    pub fn new(mem_words: usize) -> Self {
        Self {
            memory: vec![0; mem_words],
            ip: 0,
            sp: 0,
            fp: 0,
            lp: 0,
            stats: CallStats::default(),
        }
    }

    pub fn ip(&self) -> Word {
        self.ip
    }
    pub fn sp(&self) -> Word {
        self.sp
    }
    pub fn fp(&self) -> Word {
        self.fp
    }
    pub fn lp(&self) -> Word {
        self.lp
    }
    pub fn call_stats(&self) -> CallStats {
        self.stats
    }
    pub fn memory(&self) -> &[Word] {
        &self.memory
    }
    pub fn max_address(&self) -> Word {
        self.memory.len() as Word
    }

    /// Copy `image`'s words into memory starting at word 0.
    pub fn load(&mut self, image: &ExecutableImage) -> Result<(), RuntimeError> {
        let words = image.words();
        if words.len() > self.memory.len() {
            return Err(RuntimeError::ImageTooLarge {
                image_words: words.len(),
                mem_words: self.memory.len(),
            });
        }
        self.memory[..words.len()].copy_from_slice(words);
        self.memory[words.len()..].fill(0);
        Ok(())
    }

    /// Boot the standard register layout and dispatch from `ip = 0` until
    /// `HALT` or a fatal [`RuntimeError`]. `host` receives the output of
    /// `SYSCALL 0x20`/`0x21`.
    pub fn run(&mut self, host: &mut Host<'_>) -> Result<(), RuntimeError> {
        let max = self.memory.len() as Word;
        self.ip = 0;
        self.sp = max;
        self.fp = self.sp;
        self.lp = self.sp - 1;
        self.stats = CallStats::default();

        loop {
            let ip = self.ip;
            let word = self.fetch_word(ip)?;
            self.ip += 1;
            let Some(op) = Opcode::from_word(word) else {
                return Err(RuntimeError::UnknownOpcode {
                    ip: ip as usize,
                    word,
                });
            };
            trace!(ip, ?op, sp = self.sp, fp = self.fp, lp = self.lp, "dispatch");
            if self.step(op, host)? {
                return Ok(());
            }
        }
    }

    /// Execute one decoded instruction. Returns `true` on `HALT`.
    fn step(&mut self, op: Opcode, host: &mut Host<'_>) -> Result<bool, RuntimeError> {
        match op {
            Opcode::Const => {
                let k = self.fetch_operand()?;
                self.push(k)?;
            }
            Opcode::Push => {
                let a = self.fetch_operand()?;
                let v = self.read(a)?;
                self.push(v)?;
            }
            Opcode::Pop => {
                let a = self.fetch_operand()?;
                let v = self.pop()?;
                self.write(a, v)?;
            }
            Opcode::Dup => {
                let top = self.read(self.sp)?;
                self.push(top)?;
            }
            Opcode::Drop => {
                self.pop()?;
            }
            Opcode::Inc => {
                let v = self.read(self.sp)?;
                self.write(self.sp, v.wrapping_add(1))?;
            }
            Opcode::Dec => {
                let v = self.read(self.sp)?;
                self.write(self.sp, v.wrapping_sub(1))?;
            }
            Opcode::Add => self.binary_arith(Word::wrapping_add)?,
            Opcode::Sub => self.binary_arith(Word::wrapping_sub)?,
            Opcode::Mul => self.binary_arith(Word::wrapping_mul)?,
            Opcode::Div => {
                let ip = self.ip;
                let b = self.pop()?;
                let a = self.pop()?;
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero { ip: ip as usize });
                }
                self.push(a.wrapping_div(b))?;
            }
            Opcode::And => self.binary_arith(|a, b| a & b)?,
            Opcode::Or => self.binary_arith(|a, b| a | b)?,
            Opcode::Xor => self.binary_arith(|a, b| a ^ b)?,
            Opcode::Shl => self.binary_arith(|a, b| a.wrapping_shl(b as u32 & 31))?,
            Opcode::Shr => self.binary_arith(|a, b| a.wrapping_shr(b as u32 & 31))?,
            Opcode::Not => {
                let a = self.pop()?;
                self.push(!a)?;
            }
            Opcode::Jmp => {
                let target = self.ip + self.fetch_word(self.ip)?;
                self.ip = target;
            }
            Opcode::IfZero => self.conditional_jump(|v| v == 0)?,
            Opcode::IfNe => self.conditional_jump(|v| v != 0)?,
            Opcode::IfGr => self.conditional_jump(|v| v > 0)?,
            Opcode::IfGe => self.conditional_jump(|v| v >= 0)?,
            Opcode::IfLs => self.conditional_jump(|v| v < 0)?,
            Opcode::IfLe => self.conditional_jump(|v| v <= 0)?,
            Opcode::Eq => self.compare(|a, b| a == b)?,
            Opcode::NEqual => self.compare(|a, b| a != b)?,
            Opcode::Greater => self.compare(|a, b| a > b)?,
            Opcode::GrEqual => self.compare(|a, b| a >= b)?,
            Opcode::Less => self.compare(|a, b| a < b)?,
            Opcode::LsEqual => self.compare(|a, b| a <= b)?,
            Opcode::LAnd => self.compare(|a, b| a != 0 && b != 0)?,
            Opcode::LOr => self.compare(|a, b| a != 0 || b != 0)?,
            Opcode::LNot => {
                let a = self.pop()?;
                self.push(if a == 0 { 1 } else { 0 })?;
            }
            Opcode::Call => self.call()?,
            Opcode::Ret => self.ret()?,
            Opcode::Syscall => {
                let id = self.fetch_operand()?;
                self.syscall(id, host)?;
            }
            Opcode::Halt => return Ok(true),
            Opcode::Load => {
                let i = self.fetch_operand()?;
                let v = self.read(self.lp - i)?;
                self.push(v)?;
            }
            Opcode::Store => {
                let i = self.fetch_operand()?;
                let v = self.pop()?;
                self.write(self.lp - i, v)?;
            }
            Opcode::Arg => {
                let i = self.fetch_operand()?;
                let v = self.read(self.fp - i - 1)?;
                self.push(v)?;
            }
        }
        Ok(false)
    }

    /// `b = pop, a = pop, push a <op> b` — the shared shape of every
    /// arithmetic and bitwise binary opcode.
    fn binary_arith(&mut self, op: impl FnOnce(Word, Word) -> Word) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(op(a, b))
    }

    fn compare(&mut self, pred: impl FnOnce(Word, Word) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(if pred(a, b) { 1 } else { 0 })
    }

    /// `IFZERO`-shaped opcodes: pop the predicate's operand, then jump
    /// relative to the *address of this instruction's own operand word* if
    /// taken, or simply step past that operand otherwise.
    fn conditional_jump(&mut self, taken: impl FnOnce(Word) -> bool) -> Result<(), RuntimeError> {
        let operand_addr = self.ip;
        let v = self.pop()?;
        if taken(v) {
            let offset = self.fetch_word(operand_addr)?;
            self.ip = operand_addr + offset;
        } else {
            self.ip = operand_addr + 1;
        }
        Ok(())
    }

    fn call(&mut self) -> Result<(), RuntimeError> {
        let a = self.fetch_operand()?;
        let n = self.fetch_operand()?;
        let new_fp = self.sp + n;
        self.push(self.ip)?;
        self.push(self.fp)?;
        self.push(self.lp)?;
        self.fp = new_fp;
        self.lp = self.sp - 1;
        self.ip = a;
        self.stats.calls += 1;
        Ok(())
    }

    fn ret(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let anchor = self.lp;
        self.sp = self.fp;
        self.lp = self.read(anchor + 1)?;
        self.fp = self.read(anchor + 2)?;
        self.ip = self.read(anchor + 3)?;
        self.push(value)?;
        self.stats.returns += 1;
        Ok(())
    }

    /// `0x20` (string write): pop a word address, print the bytes stored
    /// there — one ASCII byte per word, low byte only — up to a nul word.
    /// `0x21` (iput): pop a word, print it as a signed decimal integer plus
    /// a newline. Any other id is reserved and is a no-op, matching §4.4's
    /// "all other syscall IDs are reserved" rather than treating an unused
    /// id as fatal.
    fn syscall(&mut self, id: Word, host: &mut Host<'_>) -> Result<(), RuntimeError> {
        match id {
            0x20 => {
                let mut addr = self.pop()?;
                let mut bytes = Vec::new();
                loop {
                    let w = self.read(addr)?;
                    if w == 0 {
                        break;
                    }
                    bytes.push(w as u8);
                    addr += 1;
                }
                let _ = host.write_all(&bytes);
            }
            0x21 => {
                let v = self.pop()?;
                let _ = writeln!(host, "{v}");
            }
            _ => {
                tracing::warn!(id, "reserved syscall id, ignored");
            }
        }
        Ok(())
    }

    fn fetch_operand(&mut self) -> Result<Word, RuntimeError> {
        let v = self.fetch_word(self.ip)?;
        self.ip += 1;
        Ok(v)
    }

    fn fetch_word(&self, addr: Word) -> Result<Word, RuntimeError> {
        self.read(addr)
    }

    fn push(&mut self, value: Word) -> Result<(), RuntimeError> {
        self.sp -= 1;
        self.write(self.sp, value)
    }

    fn pop(&mut self) -> Result<Word, RuntimeError> {
        let v = self.read(self.sp)?;
        self.sp += 1;
        Ok(v)
    }

    fn read(&self, addr: Word) -> Result<Word, RuntimeError> {
        self.index(addr).map(|i| self.memory[i])
    }

    fn write(&mut self, addr: Word, value: Word) -> Result<(), RuntimeError> {
        let i = self.index(addr)?;
        self.memory[i] = value;
        Ok(())
    }

    fn index(&self, addr: Word) -> Result<usize, RuntimeError> {
        if addr < 0 || addr as usize >= self.memory.len() {
            return Err(RuntimeError::OutOfBounds { address: addr as i64 });
        }
        Ok(addr as usize)
    }

    /// A `printState`-style one-line dump of the registers and the live
    /// stack, high address (bottom of stack) to low (top).
    pub fn state_summary(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::new();
        let _ = write!(out, "VM: IP={} FP={} LP={} SP={} STACK=[", self.ip, self.fp, self.lp);
        let max = self.memory.len() as Word;
        let mut i = max - 1;
        while i >= self.sp {
            let _ = write!(out, "{}", self.memory[i as usize]);
            if i > self.sp {
                out.push(',');
            }
            i -= 1;
        }
        out.push_str("] -> TOP");
        out
    }
}
