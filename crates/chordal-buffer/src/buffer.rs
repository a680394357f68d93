//! Rope-backed text buffer with attribute runs and selections.
//!
//! ## Why Rope?
//!
//! Ropes give O(log n) insertions and deletions anywhere in the text,
//! which matters because undo replays edits at arbitrary offsets.
//!
//! ## Learning: Guards and `Drop`
//!
//! Mutation goes through a [`Transaction`] that mutably borrows the
//! buffer. While it is alive nothing else can touch the buffer, and if
//! it is dropped without [`Transaction::commit`] its `Drop` impl rolls
//! every applied replacement back.

use ropey::Rope;

use crate::slice::normalize_runs;
use crate::storage::{ChangeObserver, ChangeSet, ObserverId, Replacement, TextStorage};
use crate::{AttributeRun, BufferError, BufferResult, SelectionChange, TextRange, TextSlice};

/// A text buffer backed by a rope data structure.
///
/// Besides characters it tracks attribute runs (absolute offsets,
/// canonical form) and the view's selections, which it keeps in sync
/// with every replacement.
pub struct TextBuffer {
    /// The rope holding our text content
    rope: Rope,

    /// Attribute runs over the whole buffer
    runs: Vec<AttributeRun>,

    /// Current selections, primary first
    selections: Vec<TextRange>,

    /// Notified once per committed transaction
    observers: Vec<(ObserverId, Box<dyn ChangeObserver>)>,

    /// Id handed to the next registered observer
    next_observer: u64,

    /// Incremented by every committed transaction
    revision: u64,
}

impl TextBuffer {
    /// Creates a new empty buffer.
    ///
    /// # Example
    /// ```
    /// use chordal_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// assert_eq!(buffer.len_chars(), 0);
    /// ```
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            runs: Vec::new(),
            selections: vec![TextRange::cursor(0)],
            observers: Vec::new(),
            next_observer: 0,
            revision: 0,
        }
    }

    /// Creates a buffer holding an attributed slice, cursor at the start.
    pub fn from_slice(slice: TextSlice) -> Self {
        let (text, runs) = slice.into_parts();
        Self {
            rope: Rope::from_str(&text),
            runs,
            ..Self::new()
        }
    }

    // ==================== Text Access ====================

    /// Returns the entire text content as a `Cow<str>`.
    ///
    /// # Learning: Cow (Clone-on-Write)
    ///
    /// For small buffers this borrows from a single rope chunk.
    /// For larger ones spanning several chunks it allocates.
    #[inline]
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Returns the whole buffer as an attributed slice.
    pub fn contents(&self) -> TextSlice {
        TextSlice::from_parts(self.text().into_owned(), self.runs.clone())
    }

    /// Returns the attribute runs of the whole buffer.
    pub fn runs(&self) -> &[AttributeRun] {
        &self.runs
    }

    /// Returns the number of characters in the buffer.
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns true if the buffer holds no text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the number of lines in the buffer.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns the revision counter.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the current selections.
    pub fn current_selections(&self) -> &[TextRange] {
        &self.selections
    }

    /// Reads a range with its attributes.
    pub fn slice(&self, range: TextRange) -> BufferResult<TextSlice> {
        self.check_range(range)?;

        let text: String = self.rope.slice(range.to_std()).into();
        let runs = self
            .runs
            .iter()
            .filter_map(|run| {
                let start = run.start.max(range.start);
                let end = run.end().min(range.end());
                (start < end).then(|| AttributeRun::new(start - range.start, end - start, run.attrs.clone()))
            })
            .collect();

        Ok(TextSlice::from_parts(text, runs))
    }

    // ==================== Mutations ====================

    /// Opens a mutation transaction.
    ///
    /// # Learning: `&mut self`
    ///
    /// The transaction holds the only mutable borrow of the buffer, so
    /// the borrow checker rules out a second transaction while this one
    /// is open.
    pub fn transaction(&mut self) -> Transaction<'_> {
        let selections_before = self.selections.clone();
        Transaction {
            buffer: self,
            applied: Vec::new(),
            rollback: Vec::new(),
            selections_before,
            committed: false,
        }
    }

    /// Validates a range against the current length.
    fn check_range(&self, range: TextRange) -> BufferResult<()> {
        let len = self.len_chars();
        if range.end() > len {
            return Err(BufferError::RangeOutOfBounds {
                start: range.start,
                end: range.end(),
                len,
            });
        }
        Ok(())
    }

    /// Replaces `range` with `slice` and returns the removed content.
    ///
    /// The range is validated before anything is touched.
    fn splice(&mut self, range: TextRange, slice: &TextSlice) -> BufferResult<TextSlice> {
        let removed = self.slice(range)?;
        let inserted_len = slice.len();

        self.rope.remove(range.to_std());
        self.rope.insert(range.start, slice.text());

        let mut runs = Vec::with_capacity(self.runs.len() + slice.runs().len() + 1);
        for run in self.runs.drain(..) {
            if run.end() <= range.start {
                runs.push(run);
            } else if run.start >= range.end() {
                runs.push(AttributeRun::new(
                    run.start - range.len + inserted_len,
                    run.len,
                    run.attrs,
                ));
            } else {
                // Straddles the replaced range: keep the parts outside it.
                if run.start < range.start {
                    runs.push(AttributeRun::new(run.start, range.start - run.start, run.attrs.clone()));
                }
                if run.end() > range.end() {
                    runs.push(AttributeRun::new(
                        range.start + inserted_len,
                        run.end() - range.end(),
                        run.attrs,
                    ));
                }
            }
        }
        runs.extend(
            slice
                .runs()
                .iter()
                .map(|run| AttributeRun::new(run.start + range.start, run.len, run.attrs.clone())),
        );
        self.runs = normalize_runs(runs);

        self.selections = self
            .selections
            .iter()
            .map(|selection| selection.map_through(range, inserted_len))
            .collect();

        Ok(removed)
    }

    fn notify(&mut self, change: &ChangeSet) {
        for (_, observer) in &mut self.observers {
            observer.on_change(change);
        }
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("text", &self.text())
            .field("runs", &self.runs)
            .field("selections", &self.selections)
            .field("observers", &self.observers.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        Self::from_slice(TextSlice::plain(s))
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl TextStorage for TextBuffer {
    fn len(&self) -> usize {
        self.len_chars()
    }

    fn read(&self, range: TextRange) -> BufferResult<TextSlice> {
        self.slice(range)
    }

    fn apply(&mut self, replacements: &[Replacement]) -> BufferResult<ChangeSet> {
        let mut tx = self.transaction();
        for replacement in replacements {
            tx.replace(replacement.range, &replacement.slice)?;
        }
        Ok(tx.commit())
    }

    fn selections(&self) -> Vec<TextRange> {
        self.selections.clone()
    }

    fn set_selections(&mut self, selections: Vec<TextRange>) -> BufferResult<SelectionChange> {
        for range in &selections {
            self.check_range(*range)?;
        }

        let from = std::mem::replace(&mut self.selections, selections);
        let change = SelectionChange::new(from, self.selections.clone());
        if !change.is_unchanged() {
            let notice = ChangeSet {
                revision: self.revision,
                replacements: Vec::new(),
                selections: change.clone(),
            };
            self.notify(&notice);
        }
        Ok(change)
    }

    fn observe(&mut self, observer: Box<dyn ChangeObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }
}

/// A scoped mutation transaction.
///
/// Replacements are applied immediately but observers only hear about
/// them on [`commit`](Transaction::commit). Dropping an uncommitted
/// transaction restores the buffer.
pub struct Transaction<'a> {
    buffer: &'a mut TextBuffer,
    applied: Vec<Replacement>,
    rollback: Vec<Replacement>,
    selections_before: Vec<TextRange>,
    committed: bool,
}

impl Transaction<'_> {
    /// Replaces `range` with `slice`, returning what was removed.
    pub fn replace(&mut self, range: TextRange, slice: &TextSlice) -> BufferResult<TextSlice> {
        let removed = self.buffer.splice(range, slice)?;
        self.rollback
            .push(Replacement::new(TextRange::new(range.start, slice.len()), removed.clone()));
        self.applied.push(Replacement::new(range, slice.clone()));
        Ok(removed)
    }

    /// Read access to the buffer as it stands inside the transaction.
    pub fn buffer(&self) -> &TextBuffer {
        self.buffer
    }

    /// Commits the transaction and notifies observers once.
    pub fn commit(mut self) -> ChangeSet {
        self.committed = true;
        self.buffer.revision += 1;

        let change = ChangeSet {
            revision: self.buffer.revision,
            replacements: std::mem::take(&mut self.applied),
            selections: SelectionChange::new(
                std::mem::take(&mut self.selections_before),
                self.buffer.selections.clone(),
            ),
        };
        self.buffer.notify(&change);
        change
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some(undo) = self.rollback.pop() {
            let restored = self.buffer.splice(undo.range, &undo.slice);
            debug_assert!(restored.is_ok(), "rollback range must be valid");
        }
        self.buffer.selections = std::mem::take(&mut self.selections_before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Attributes;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn bold() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("weight".to_string(), "bold".to_string());
        attrs
    }

    #[test]
    fn test_replace_moves_cursor() {
        let mut buffer = TextBuffer::from("Hello");
        buffer.set_selections(vec![TextRange::cursor(5)]).unwrap();

        buffer.replace(TextRange::cursor(5), &TextSlice::plain(", World")).unwrap();

        assert_eq!(buffer.text(), "Hello, World");
        assert_eq!(buffer.current_selections(), &[TextRange::cursor(12)]);
    }

    #[test]
    fn test_out_of_bounds_replace_leaves_buffer_untouched() {
        let mut buffer = TextBuffer::from("abc");
        let err = buffer.replace(TextRange::new(2, 5), &TextSlice::plain("x")).unwrap_err();

        assert!(matches!(err, BufferError::RangeOutOfBounds { end: 7, len: 3, .. }));
        assert_eq!(buffer.text(), "abc");
        assert_eq!(buffer.revision(), 0);
    }

    #[test]
    fn test_failed_batch_rolls_back_earlier_replacements() {
        let mut buffer = TextBuffer::from("abc");
        let result = buffer.apply(&[
            Replacement::new(TextRange::new(0, 1), "X"),
            Replacement::new(TextRange::new(10, 1), "Y"),
        ]);

        assert!(result.is_err());
        assert_eq!(buffer.text(), "abc");
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let mut buffer = TextBuffer::from("abc");
        {
            let mut tx = buffer.transaction();
            tx.replace(TextRange::new(0, 3), &TextSlice::plain("xyz!")).unwrap();
            assert_eq!(tx.buffer().text(), "xyz!");
        }
        assert_eq!(buffer.text(), "abc");
        assert_eq!(buffer.current_selections(), &[TextRange::cursor(0)]);
    }

    #[test]
    fn test_observers_fire_once_per_transaction() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut buffer = TextBuffer::new();
        buffer.observe(Box::new(move |change: &ChangeSet| {
            sink.borrow_mut().push(change.replacements.len());
        }));

        buffer
            .apply(&[
                Replacement::new(TextRange::cursor(0), "ab"),
                Replacement::new(TextRange::cursor(2), "cd"),
            ])
            .unwrap();

        assert_eq!(buffer.text(), "abcd");
        assert_eq!(*seen.borrow(), vec![2]);
    }

    #[test]
    fn test_read_clips_attribute_runs() {
        let buffer = TextBuffer::from_slice(
            TextSlice::with_runs("plain bold", vec![AttributeRun::new(6, 4, bold())]).unwrap(),
        );

        let slice = buffer.read(TextRange::new(4, 4)).unwrap();
        assert_eq!(slice.text(), "n bo");
        assert_eq!(slice.runs(), &[AttributeRun::new(2, 2, bold())]);
    }

    #[test]
    fn test_replace_then_restore_is_exact() {
        let original = TextSlice::with_runs("aaBBBcc", vec![AttributeRun::new(2, 3, bold())]).unwrap();
        let mut buffer = TextBuffer::from_slice(original.clone());

        let target = TextRange::new(3, 3);
        let previous = buffer.read(target).unwrap();
        buffer.replace(target, &TextSlice::plain("zz")).unwrap();
        assert_eq!(buffer.text(), "aaBzzc");

        buffer.replace(TextRange::new(3, 2), &previous).unwrap();
        assert_eq!(buffer.contents(), original);
    }

    #[test]
    fn test_selection_change_notifies_observers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut buffer = TextBuffer::from("abc");
        buffer.observe(Box::new(move |change: &ChangeSet| {
            sink.borrow_mut().push(change.selections.to.clone());
        }));

        buffer.set_selections(vec![TextRange::new(1, 2)]).unwrap();
        assert_eq!(*seen.borrow(), vec![vec![TextRange::new(1, 2)]]);

        let err = buffer.set_selections(vec![TextRange::new(2, 5)]).unwrap_err();
        assert!(matches!(err, BufferError::RangeOutOfBounds { .. }));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_unobserve_stops_notifications() {
        let seen = Rc::new(RefCell::new(0));
        let first = Rc::clone(&seen);
        let second = Rc::clone(&seen);

        let mut buffer = TextBuffer::new();
        let a = buffer.observe(Box::new(move |_: &ChangeSet| *first.borrow_mut() += 1));
        let b = buffer.observe(Box::new(move |_: &ChangeSet| *second.borrow_mut() += 10));
        assert_ne!(a, b);

        buffer.replace(TextRange::cursor(0), &"x".into()).unwrap();
        assert_eq!(*seen.borrow(), 11);

        assert!(buffer.unobserve(b));
        assert!(!buffer.unobserve(b));
        buffer.replace(TextRange::cursor(1), &"y".into()).unwrap();
        assert_eq!(*seen.borrow(), 12);
    }
}
