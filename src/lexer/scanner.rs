//! Byte-level cursor over one file's source text.
//!
//! Metamath source is ASCII-only (spec.md §4.1), so we scan bytes
//! rather than `char`s — matching the teacher's own choice to
//! hand-roll a byte-cursor lexer in `src/syntax/formatter/lexer.rs`
//! where `logos`'s declarative token enum doesn't fit the grammar.

use crate::model::{FileId, Position, Span};

pub const WHITESPACE: &[u8] = b" \t\n\r\x0c";

pub fn is_whitespace(b: u8) -> bool {
    WHITESPACE.contains(&b)
}

/// Printable ASCII excluding space (0x21..=0x7E).
pub fn is_printable_nonspace(b: u8) -> bool {
    (0x21..=0x7E).contains(&b)
}

pub struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    file: FileId,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, file: FileId) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            line: 0,
            col: 0,
            file,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    pub fn span_from(&self, start: Position) -> Span {
        Span::new(self.file, start, self.position())
    }

    /// Advance over one byte, updating line/column.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.bump();
            } else {
                break;
            }
        }
    }
}
