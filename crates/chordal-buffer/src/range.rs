//! Character ranges and selection changes.
//!
//! ## Learning: Range Types
//!
//! Rust's standard library has `Range<T>` (exclusive end). Text ranges
//! here are stored as `start` + `len` instead, because an edit's inverse
//! is described by where it starts and how much text it left behind.
//! `to_std()` converts back when slicing.

use serde::{Deserialize, Serialize};

/// A span of characters in a buffer.
///
/// Offsets count Unicode scalar values, not bytes. A zero-length range
/// is a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    /// First character covered by the range
    pub start: usize,
    /// Number of characters covered
    pub len: usize,
}

impl TextRange {
    /// Creates a new range.
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Creates a zero-width range (cursor position).
    pub fn cursor(position: usize) -> Self {
        Self {
            start: position,
            len: 0,
        }
    }

    /// Creates a range between two offsets, in either order.
    pub fn between(a: usize, b: usize) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self {
            start,
            len: end - start,
        }
    }

    /// Exclusive end offset.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Returns true if this is a zero-width range (just a cursor).
    #[inline]
    pub fn is_cursor(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `offset` falls inside the range.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Returns true if the two ranges overlap or share a boundary.
    pub fn touches(&self, other: &TextRange) -> bool {
        self.start <= other.end() && other.start <= self.end()
    }

    /// Converts to a standard library range.
    pub fn to_std(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }

    /// Maps this range through a replacement of `replaced` by
    /// `inserted_len` characters.
    ///
    /// Ranges touching the replacement collapse to a cursor after the
    /// inserted text, ranges after it shift, ranges before it are kept.
    pub fn map_through(&self, replaced: TextRange, inserted_len: usize) -> TextRange {
        if self.touches(&replaced) {
            TextRange::cursor(replaced.start + inserted_len)
        } else if self.start >= replaced.end() {
            TextRange::new(self.start - replaced.len + inserted_len, self.len)
        } else {
            *self
        }
    }
}

impl From<std::ops::Range<usize>> for TextRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        TextRange::between(range.start, range.end)
    }
}

impl std::fmt::Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

/// A selection change reported by the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionChange {
    /// Selections before the change
    pub from: Vec<TextRange>,
    /// Selections after the change
    pub to: Vec<TextRange>,
}

impl SelectionChange {
    /// Creates a new selection change.
    pub fn new(from: Vec<TextRange>, to: Vec<TextRange>) -> Self {
        Self { from, to }
    }

    /// Returns true if nothing moved.
    pub fn is_unchanged(&self) -> bool {
        self.from == self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_normalizes() {
        let range = TextRange::between(7, 3);
        assert_eq!(range, TextRange::new(3, 4));
        assert_eq!(range.end(), 7);
    }

    #[test]
    fn test_contains_is_end_exclusive() {
        let range = TextRange::new(2, 3);
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(!TextRange::cursor(2).contains(2));
    }

    #[test]
    fn test_cursor_follows_insertion() {
        let cursor = TextRange::cursor(5);
        assert_eq!(cursor.map_through(TextRange::cursor(5), 3), TextRange::cursor(8));
    }

    #[test]
    fn test_cursor_follows_backspace() {
        let cursor = TextRange::cursor(5);
        assert_eq!(cursor.map_through(TextRange::new(4, 1), 0), TextRange::cursor(4));
    }

    #[test]
    fn test_unrelated_ranges_shift_or_stay() {
        let before = TextRange::new(0, 2);
        let after = TextRange::new(10, 2);
        let replaced = TextRange::new(4, 2);

        assert_eq!(before.map_through(replaced, 5), before);
        assert_eq!(after.map_through(replaced, 5), TextRange::new(13, 2));
    }
}
