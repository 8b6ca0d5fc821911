//! Source location tracking, in the line/column style used throughout
//! this crate for diagnostics (grounded on `base::position::{Position, Span}`
//! in the teacher repository).

/// A 0-indexed line/column position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A half-open range of positions, plus the file it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: crate::model::FileId,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(file: crate::model::FileId, start: Position, end: Position) -> Self {
        Self { file, start, end }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file.0,
            self.start.line + 1,
            self.start.column + 1
        )
    }
}

/// An interned source file identifier (teacher's `base::FileId`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);
