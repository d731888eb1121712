//! Line/column positions for diagnostics rendering.
//!
//! The IR and scanner work in byte offsets; the reporter and the diagnostic
//! model want `line:column` pairs. `LineMap` converts between the two.

use memchr::memchr_iter;

/// A position in a source file (1-indexed line and column, as printed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    /// 1-indexed line number
    pub line: u32,
    /// 1-indexed column, counted in characters
    pub column: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line map for offset <-> position conversion.
///
/// Stores the starting byte offset of each line; lookups are a binary search.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Starting offset of each line (`line_starts[0]` is always 0)
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    #[must_use]
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for idx in memchr_iter(b'\n', source.as_bytes()) {
            line_starts.push(u32::try_from(idx + 1).unwrap_or(u32::MAX));
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 1-indexed line/column position.
    #[must_use]
    pub fn position(&self, offset: u32, source: &str) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };

        let line_start = (self.line_starts[line] as usize).min(source.len());
        let end = (offset as usize).min(source.len());
        let start = line_start.min(end);
        let column = source.get(start..end).unwrap_or("").chars().count();

        Position {
            line: u32::try_from(line + 1).unwrap_or(u32::MAX),
            column: u32::try_from(column + 1).unwrap_or(u32::MAX),
        }
    }

    /// Get the starting offset of a 0-indexed line.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<u32> {
        self.line_starts.get(line).copied()
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
#[path = "tests/position.rs"]
mod tests;
