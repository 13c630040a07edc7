//! Source locations within a Grin program.

use std::fmt::{self, Display};

/// A (line, column) position within the text of a Grin program. Both fields
/// are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    line: usize,
    column: usize,
}

impl Location {
    /// Builds a new location. Both `line` and `column` must be at least 1.
    pub fn new(line: usize, column: usize) -> Self {
        assert!(line >= 1, "line in location cannot be non-positive, was {line}");
        assert!(
            column >= 1,
            "column in location cannot be non-positive, was {column}"
        );

        Self { line, column }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {} Column {}", self.line, self.column)
    }
}
