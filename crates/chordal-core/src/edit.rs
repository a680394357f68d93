//! Reversible buffer edits.
//!
//! An [`Edit`] records both what it writes and what it overwrote, so its
//! inverse is a pure function of the edit itself. No closures capture
//! buffer state; undo data is plain values that can be inspected,
//! logged and serialized.

use chordal_buffer::{TextRange, TextSlice, TextStorage};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// The type of edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    /// Text was inserted at a cursor
    Insert,
    /// Text was removed
    Delete,
    /// A non-empty range was overwritten with new text
    Replace,
}

impl EditKind {
    /// Classifies a replacement of `range` by `inserted`.
    pub fn classify(range: TextRange, inserted: &TextSlice) -> Self {
        if inserted.is_empty() {
            EditKind::Delete
        } else if range.is_cursor() {
            EditKind::Insert
        } else {
            EditKind::Replace
        }
    }
}

/// A single replacement together with the content it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// What kind of edit this is
    pub kind: EditKind,
    /// Range replaced, in buffer coordinates before the edit
    pub range: TextRange,
    /// Content written over `range`
    pub inserted: TextSlice,
    /// Content `range` held before the edit
    pub removed: TextSlice,
}

impl Edit {
    /// Creates an edit from its parts.
    pub fn new(range: TextRange, inserted: TextSlice, removed: TextSlice) -> Self {
        Self {
            kind: EditKind::classify(range, &inserted),
            range,
            inserted,
            removed,
        }
    }

    /// Reads the current content of `range` and describes replacing it.
    ///
    /// Nothing is written; the buffer is only read.
    pub fn capture(
        storage: &dyn TextStorage,
        range: TextRange,
        inserted: TextSlice,
    ) -> CoreResult<Self> {
        let removed = storage.read(range)?;
        Ok(Self::new(range, inserted, removed))
    }

    /// Where the inserted content sits once the edit has been applied.
    pub fn range_after(&self) -> TextRange {
        TextRange::new(self.range.start, self.inserted.len())
    }

    /// Returns the edit that restores the buffer to its state before
    /// this one was applied.
    pub fn inverse(&self) -> Edit {
        Edit::new(
            self.range_after(),
            self.removed.clone(),
            self.inserted.clone(),
        )
    }

    /// Returns true if applying the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.removed.is_empty()
    }

    /// Applies the edit as one mutation transaction.
    pub fn apply(&self, storage: &mut dyn TextStorage) -> CoreResult<()> {
        storage.replace(self.range, &self.inserted)?;
        Ok(())
    }
}

/// Describes replacing the primary range with `replacement`.
///
/// Captures the previous content of the first range before the forward
/// edit is described. Extra ranges are ignored.
pub fn modify(
    storage: &dyn TextStorage,
    ranges: &[TextRange],
    replacement: impl Into<TextSlice>,
) -> CoreResult<Edit> {
    let Some(&primary) = ranges.first() else {
        return Err(CoreError::InvalidRange("no selection to edit".to_string()));
    };
    if ranges.len() > 1 {
        tracing::trace!(ignored = ranges.len() - 1, "Editing primary range only");
    }

    Edit::capture(storage, primary, replacement.into())
}

/// Ranges a backward delete acts on.
///
/// A cursor after the first character deletes the character before it;
/// anything else (a real selection, a cursor at 0, an empty buffer)
/// is used as-is.
pub fn backward_delete_ranges(selections: &[TextRange], len: usize) -> Vec<TextRange> {
    match selections.first() {
        Some(primary) if primary.is_cursor() && primary.start > 0 && primary.start <= len => {
            vec![TextRange::new(primary.start - 1, 1)]
        }
        _ => selections.to_vec(),
    }
}

/// Ranges a forward delete acts on.
pub fn forward_delete_ranges(selections: &[TextRange], len: usize) -> Vec<TextRange> {
    match selections.first() {
        Some(primary) if primary.is_cursor() && primary.start < len => {
            vec![TextRange::new(primary.start, 1)]
        }
        _ => selections.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chordal_buffer::{Attributes, AttributeRun, BufferError, TextBuffer};

    fn italic() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("style".to_string(), "italic".to_string());
        attrs
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(EditKind::classify(TextRange::cursor(3), &"a".into()), EditKind::Insert);
        assert_eq!(EditKind::classify(TextRange::new(3, 2), &TextSlice::new()), EditKind::Delete);
        assert_eq!(EditKind::classify(TextRange::new(3, 2), &"a".into()), EditKind::Replace);
    }

    #[test]
    fn test_insert_then_inverse_restores() {
        let mut buffer = TextBuffer::from("abc");
        let edit = modify(&buffer, &[TextRange::cursor(1)], "XYZ").unwrap();
        assert_eq!(edit.kind, EditKind::Insert);

        edit.apply(&mut buffer).unwrap();
        assert_eq!(buffer.text(), "aXYZbc");

        let inverse = edit.inverse();
        assert_eq!(inverse.range, TextRange::new(1, 3));
        assert_eq!(inverse.kind, EditKind::Delete);
        inverse.apply(&mut buffer).unwrap();
        assert_eq!(buffer.text(), "abc");
    }

    #[test]
    fn test_replace_restores_attributes() {
        let slice = TextSlice::with_runs("hello", vec![AttributeRun::new(1, 3, italic())]).unwrap();
        let mut buffer = TextBuffer::from_slice(slice.clone());

        let edit = modify(&buffer, &[TextRange::new(0, 5)], "bye").unwrap();
        assert_eq!(edit.kind, EditKind::Replace);
        edit.apply(&mut buffer).unwrap();
        assert_eq!(buffer.text(), "bye");

        edit.inverse().apply(&mut buffer).unwrap();
        assert_eq!(buffer.contents(), slice);
    }

    #[test]
    fn test_only_primary_range_is_edited() {
        let mut buffer = TextBuffer::from("abcdef");
        let edit = modify(&buffer, &[TextRange::new(0, 1), TextRange::new(4, 1)], "").unwrap();
        edit.apply(&mut buffer).unwrap();
        assert_eq!(buffer.text(), "bcdef");
    }

    #[test]
    fn test_no_ranges_is_invalid() {
        let buffer = TextBuffer::from("abc");
        assert!(matches!(modify(&buffer, &[], "x"), Err(CoreError::InvalidRange(_))));
    }

    #[test]
    fn test_range_past_end_fails_before_mutation() {
        let buffer = TextBuffer::from("abc");
        let err = modify(&buffer, &[TextRange::new(2, 5)], "x").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Buffer(BufferError::RangeOutOfBounds { .. })
        ));
        assert_eq!(buffer.text(), "abc");
    }

    #[test]
    fn test_backward_delete_ranges() {
        assert_eq!(
            backward_delete_ranges(&[TextRange::cursor(3)], 5),
            vec![TextRange::new(2, 1)]
        );
        assert_eq!(
            backward_delete_ranges(&[TextRange::cursor(0)], 5),
            vec![TextRange::cursor(0)]
        );
        assert_eq!(
            backward_delete_ranges(&[TextRange::new(1, 2)], 5),
            vec![TextRange::new(1, 2)]
        );
    }

    #[test]
    fn test_forward_delete_ranges() {
        assert_eq!(
            forward_delete_ranges(&[TextRange::cursor(3)], 5),
            vec![TextRange::new(3, 1)]
        );
        assert_eq!(
            forward_delete_ranges(&[TextRange::cursor(5)], 5),
            vec![TextRange::cursor(5)]
        );
    }
}
