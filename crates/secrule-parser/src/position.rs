//! Source positions for tokens, AST nodes and diagnostics.
//!
//! Lines and columns are 1-based. Columns count characters, not bytes, so a
//! position printed for a line containing multi-byte UTF-8 still points at
//! the character an editor shows.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// A `file:line:column` location in a SecRule source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    /// Source label supplied by the caller (usually a path). `None` for
    /// anonymous input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Arc<str>>,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: Option<Arc<str>>, line: usize, column: usize) -> Self {
        Position { file, line, column }
    }

    /// The source label, or the empty string for anonymous input.
    pub fn file_name(&self) -> &str {
        self.file.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}:{}", self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// A value tagged with the position it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Positioned<T> {
    pub node: T,
    pub position: Position,
}

impl<T> Positioned<T> {
    pub fn new(node: T, position: Position) -> Self {
        Positioned { node, position }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Positioned<U> {
        Positioned {
            node: f(self.node),
            position: self.position,
        }
    }
}

impl<T> std::ops::Deref for Positioned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.node
    }
}

// =============================================================================
// LineIndex
// =============================================================================

/// A pre-computed line index for byte offset → [`Position`] lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    file: Option<Arc<str>>,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
    /// Last lookup as (line, byte offset, column). A later offset on the same
    /// line counts characters from there instead of from the line start.
    last: Cell<(usize, usize, usize)>,
}

impl LineIndex {
    pub fn new(file: Option<Arc<str>>, text: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        LineIndex {
            file,
            line_starts,
            last: Cell::new((0, 0, 0)),
        }
    }

    /// Convert a byte offset into `text` (the same text the index was built
    /// from) to a [`Position`]. Offsets past the end clamp to the last line.
    pub fn position_of(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(text.len());
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let (last_line, last_offset, last_column) = self.last.get();
        let (from, base) = if last_line == line && last_offset <= offset {
            (last_offset, last_column)
        } else {
            (self.line_starts[line], 0)
        };
        let column = base
            + text
                .get(from..offset)
                .map_or(offset - from, |span| span.chars().count());
        self.last.set((line, offset, column));
        Position::new(self.file.clone(), line + 1, column + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
