//! # Chordal Buffer
//!
//! Rope-backed text storage used by the chordal command engine.
//!
//! ## Key Concepts
//!
//! ### The storage contract
//! - [`TextStorage`] is the interface commands edit through
//! - Reads return attributed [`TextSlice`]s, not just characters
//! - Writes happen inside a mutation transaction; observers hear about
//!   a transaction exactly once, after it commits
//!
//! ### Memory Safety
//! - A [`Transaction`] holds the buffer's only mutable borrow
//! - Ranges are validated before the rope is touched

mod buffer;
mod range;
mod slice;
mod storage;

pub use buffer::{TextBuffer, Transaction};
pub use range::{SelectionChange, TextRange};
pub use slice::{AttributeRun, Attributes, TextSlice};
pub use storage::{ChangeObserver, ChangeSet, ObserverId, Replacement, TextStorage};

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Range {start}..{end} is out of bounds for length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Attribute run {start}+{len} exceeds text length {text_len}")]
    InvalidAttributeRun {
        start: usize,
        len: usize,
        text_len: usize,
    },

    #[error("Attribute runs overlap at offset {at}")]
    OverlappingRuns { at: usize },

    #[error("Another mutation transaction is in progress")]
    TransactionInProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buffer = TextBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len_chars(), 0);
        assert_eq!(buffer.selections(), vec![TextRange::cursor(0)]);
    }

    #[test]
    fn test_buffer_from_string() {
        let buffer = TextBuffer::from("Hello, World!");
        assert_eq!(buffer.len(), 13);
        assert_eq!(buffer.text(), "Hello, World!");
    }

    #[test]
    fn test_insert_and_delete() {
        let mut buffer = TextBuffer::new();
        buffer.replace(TextRange::cursor(0), &"Hello".into()).unwrap();
        assert_eq!(buffer.text(), "Hello");

        buffer.replace(TextRange::cursor(5), &", World!".into()).unwrap();
        assert_eq!(buffer.text(), "Hello, World!");

        buffer.replace(TextRange::new(5, 2), &TextSlice::new()).unwrap();
        assert_eq!(buffer.text(), "HelloWorld!");
        assert_eq!(buffer.revision(), 3);
    }

    #[test]
    fn test_line_count() {
        let buffer = TextBuffer::from("Line 1\nLine 2\nLine 3");
        assert_eq!(buffer.len_lines(), 3);
    }
}
