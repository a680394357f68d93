//! Documents bound to a mode.
//!
//! ## Learning: Shared Ownership with `Rc<RefCell<_>>`
//!
//! The host owns the buffer and so does the active mode. `Rc` shares
//! it, `RefCell` moves the exclusive-access check to runtime: a second
//! mutable borrow while a transaction is open fails instead of racing.

use chordal_buffer::{BufferError, TextBuffer, TextRange, TextSlice, TextStorage};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

use crate::CoreResult;

/// Shared handle to a buffer collaborator.
pub type BufferHandle = Rc<RefCell<dyn TextStorage>>;

/// Unique identifier for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new unique document ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named buffer handle.
///
/// Cloning a document clones the handle, not the text.
#[derive(Clone)]
pub struct Document {
    id: DocumentId,
    name: String,
    buffer: BufferHandle,
}

impl Document {
    /// Wraps an existing buffer handle.
    pub fn new(name: impl Into<String>, buffer: BufferHandle) -> Self {
        Self {
            id: DocumentId::new(),
            name: name.into(),
            buffer,
        }
    }

    /// Creates a document over a fresh rope buffer.
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, Rc::new(RefCell::new(TextBuffer::from(text))))
    }

    /// Creates an untitled, empty document.
    pub fn untitled() -> Self {
        Self::from_text("untitled", "")
    }

    #[inline]
    pub fn id(&self) -> DocumentId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn buffer(&self) -> &BufferHandle {
        &self.buffer
    }

    /// Reads the whole document, attributes included.
    pub fn contents(&self) -> CoreResult<TextSlice> {
        let storage = self
            .buffer
            .try_borrow()
            .map_err(|_| BufferError::TransactionInProgress)?;
        Ok(storage.read(TextRange::new(0, storage.len()))?)
    }

    /// Reads the whole document as plain text.
    pub fn text(&self) -> CoreResult<String> {
        Ok(self.contents()?.text().to_string())
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
