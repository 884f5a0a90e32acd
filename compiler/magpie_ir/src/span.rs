//! Source locations.
//!
//! The evaluator only needs one capability from the syntax layer: turning a
//! node's location into the `line N: ` prefix stamped on every runtime error.
//! Nodes carry a [`Position`]; parsers that work in byte offsets build a
//! [`LineIndex`] once per source file and resolve each [`Span`] through it.

use std::fmt;

/// Byte range in a source file (`end` exclusive).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Resolved line/column of a node (both 1-based; 0 means unknown).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// Position of synthesized nodes with no source location.
    pub const UNKNOWN: Position = Position { line: 0, column: 0 };

    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// Position at the start of `line`.
    #[inline]
    pub const fn line(line: u32) -> Self {
        Position { line, column: 1 }
    }

    #[inline]
    pub const fn is_known(&self) -> bool {
        self.line > 0
    }

    /// The diagnostic prefix for errors raised at this position.
    ///
    /// Unknown positions produce an empty prefix so synthesized nodes do not
    /// print a misleading `line 0: `.
    pub fn prefix(&self) -> String {
        if self.is_known() {
            format!("line {}: ", self.line)
        } else {
            String::new()
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line start table for converting byte offsets to positions.
#[derive(Clone, Debug, Default)]
pub struct LineIndex {
    /// Byte offset at which each line starts. Always begins with 0.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build the index for a source text.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(u32::try_from(offset + 1).unwrap_or(u32::MAX));
            }
        }
        LineIndex { line_starts }
    }

    /// Number of lines in the indexed source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Resolve a byte offset to a 1-based position.
    pub fn position(&self, offset: u32) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        Position {
            line: u32::try_from(line_idx + 1).unwrap_or(u32::MAX),
            column: offset - start + 1,
        }
    }

    /// Resolve the start of a span.
    pub fn span_position(&self, span: Span) -> Position {
        self.position(span.start)
    }
}
