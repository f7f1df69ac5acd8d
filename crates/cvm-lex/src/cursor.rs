//! Byte cursor for traversing source text.
//!
//! The source language is ASCII-only: whitespace is space/tab/CR/LF,
//! identifiers are `[a-zA-Z][a-zA-Z0-9]*`, so the cursor walks bytes
//! directly rather than decoding UTF-8 scalar values. This keeps `advance`
//! and `peek` O(1) instead of paying for `char_indices` bookkeeping the
//! grammar never needs.

use cvm_util::Pos;

/// A cursor over a source buffer, tracking byte offset and (row, column).
pub struct Cursor<'a> {
    source: &'a [u8],
    offset: usize,
    pos: Pos,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            offset: 0,
            pos: Pos::START,
        }
    }

    /// Current byte offset into the source.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// (row, column) of the byte at the current offset.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// The byte at the current offset, or `None` past the end.
    pub fn current(&self) -> Option<u8> {
        self.source.get(self.offset).copied()
    }

    /// The byte `n` positions ahead of the current offset, without moving.
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.source.get(self.offset + n).copied()
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.source.len()
    }

    /// Advance past the current byte, updating row/column: a
    /// newline increments the row and resets the column to 1.
    pub fn advance(&mut self) {
        if let Some(b) = self.current() {
            self.offset += 1;
            if b == b'\n' {
                self.pos.row += 1;
                self.pos.col = 1;
            } else {
                self.pos.col += 1;
            }
        }
    }
}
