//! Source location types
//!
//! Byte ranges into a document's source text, together with the
//! human-facing line/column of the range start.

use serde::{Deserialize, Serialize};

/// Half-open byte range `start..end` into a document, plus the 1-based
/// line and column of `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Create a zero span (0:0)
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Narrow this span to a sub-range given relative to `start`.
    ///
    /// The column is shifted by the relative offset, which is exact for
    /// single-line scalars and an approximation for folded ones.
    pub fn slice(&self, relative_start: usize, relative_end: usize) -> Span {
        Span {
            start: self.start + relative_start,
            end: self.start + relative_end.max(relative_start),
            line: self.line,
            column: self.column + relative_start as u32,
        }
    }

    /// Compute the span of `start..end` by counting lines in `source`.
    pub fn locate(source: &str, start: usize, end: usize) -> Span {
        let start = start.min(source.len());
        let prefix = &source[..floor_char_boundary(source, start)];
        let line = prefix.matches('\n').count() as u32 + 1;
        let column = match prefix.rfind('\n') {
            Some(nl) => prefix[nl + 1..].chars().count() as u32 + 1,
            None => prefix.chars().count() as u32 + 1,
        };
        Span::new(start, end.max(start), line, column)
    }
}

fn floor_char_boundary(source: &str, mut index: usize) -> usize {
    while index > 0 && !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}
