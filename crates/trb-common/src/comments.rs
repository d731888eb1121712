//! Comment extraction.
//!
//! Comments are not IR nodes; the regenerative printer re-attaches them
//! from the source text, and the declaration emitter copies leading
//! comments above each published declaration. This module scans the raw
//! source for `#` line comments, skipping string contents so that
//! interpolation markers (`#{`) are not mistaken for comments.

use serde::{Deserialize, Serialize};

/// A comment's byte range in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRange {
    /// Start offset of the `#`
    pub pos: u32,
    /// End offset (exclusive, before the newline)
    pub end: u32,
}

impl CommentRange {
    pub fn new(pos: u32, end: u32) -> Self {
        CommentRange { pos, end }
    }

    /// The comment text, including the leading `#`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.pos as usize..self.end as usize)
            .unwrap_or("")
    }
}

/// Scan the source for all `#` line comments, in source order.
pub fn comment_ranges(source: &str) -> Vec<CommentRange> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut comments = Vec::new();
    let mut pos = 0;

    while pos < len {
        match bytes[pos] {
            // Skip string literals so `"#{x}"` is not treated as a comment.
            quote @ (b'"' | b'\'') => {
                pos += 1;
                while pos < len && bytes[pos] != quote {
                    if bytes[pos] == b'\\' {
                        pos += 1;
                    }
                    pos += 1;
                }
                pos += 1;
            }
            b'#' => {
                let start = pos as u32;
                while pos < len && bytes[pos] != b'\n' {
                    pos += 1;
                }
                comments.push(CommentRange::new(start, pos as u32));
            }
            _ => pos += 1,
        }
    }

    comments
}

/// Comments immediately above `pos`, with no blank line between them and
/// at most one blank line between the block and the declaration.
pub fn leading_comments(comments: &[CommentRange], pos: u32, source: &str) -> Vec<CommentRange> {
    let idx = comments.partition_point(|c| c.end <= pos);
    if idx == 0 {
        return Vec::new();
    }

    let mut result: Vec<CommentRange> = Vec::new();
    for i in (0..idx).rev() {
        let comment = comments[i];
        let check_pos = result.last().map_or(pos, |c| c.pos);
        let between = source
            .get(comment.end as usize..check_pos as usize)
            .unwrap_or("");
        let newlines = between.bytes().filter(|&b| b == b'\n').count();
        // Adjacent line comments stack; a blank line or code in between ends the block.
        let limit = if result.is_empty() { 2 } else { 1 };
        if newlines > limit || !between.chars().all(|c| c.is_ascii_whitespace()) {
            break;
        }
        result.push(comment);
    }

    result.reverse();
    result
}

#[cfg(test)]
#[path = "tests/comments.rs"]
mod tests;
