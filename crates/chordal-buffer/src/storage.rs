//! The storage interface editing commands are written against.
//!
//! ## Learning: Trait Objects
//!
//! Commands only ever see `&dyn TextStorage` / `&mut dyn TextStorage`.
//! The rope-backed `TextBuffer` is one implementation; a GUI host can
//! provide another that wraps its own text system.

use serde::{Deserialize, Serialize};

use crate::{BufferResult, SelectionChange, TextRange, TextSlice};

/// One replacement inside a mutation transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Range to replace, in the coordinates current when it is applied
    pub range: TextRange,
    /// Replacement content
    pub slice: TextSlice,
}

impl Replacement {
    /// Creates a new replacement.
    pub fn new(range: TextRange, slice: impl Into<TextSlice>) -> Self {
        Self {
            range,
            slice: slice.into(),
        }
    }
}

/// Summary of one committed transaction, handed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    /// Buffer revision after the transaction
    pub revision: u64,
    /// Replacements in the order they were applied
    pub replacements: Vec<Replacement>,
    /// How the selections moved
    pub selections: SelectionChange,
}

/// Handle for a registered observer, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Receives a notification once per committed transaction.
pub trait ChangeObserver {
    /// Called after every replacement of the transaction has been applied.
    fn on_change(&mut self, change: &ChangeSet);
}

impl<F> ChangeObserver for F
where
    F: FnMut(&ChangeSet),
{
    fn on_change(&mut self, change: &ChangeSet) {
        self(change)
    }
}

/// Read/mutate interface of a text buffer.
pub trait TextStorage {
    /// Number of characters.
    fn len(&self) -> usize;

    /// Returns true if the storage holds no text.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads a range, including attributes.
    fn read(&self, range: TextRange) -> BufferResult<TextSlice>;

    /// Applies replacements as one mutation transaction.
    ///
    /// Either every replacement is applied and observers are notified
    /// once, or none is and the storage is left untouched.
    fn apply(&mut self, replacements: &[Replacement]) -> BufferResult<ChangeSet>;

    /// Replaces a single range as one mutation transaction.
    fn replace(&mut self, range: TextRange, slice: &TextSlice) -> BufferResult<ChangeSet> {
        self.apply(&[Replacement::new(range, slice.clone())])
    }

    /// Snapshot of the current selections, primary first.
    fn selections(&self) -> Vec<TextRange>;

    /// Moves the selections (view layer input such as mouse clicks).
    fn set_selections(&mut self, selections: Vec<TextRange>) -> BufferResult<SelectionChange>;

    /// Registers an observer for committed transactions.
    fn observe(&mut self, observer: Box<dyn ChangeObserver>) -> ObserverId;

    /// Removes an observer. Returns false if it was not registered.
    fn unobserve(&mut self, id: ObserverId) -> bool;
}
