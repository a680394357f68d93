//! # Chordal Core
//!
//! Turns normalized key presses into reversible edits and keeps a
//! grouped undo/redo history.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     CommandReader                        │
//! │   input queue ──► Mode ──► Command ──► History ──► buffer │
//! │        ▲          │                               │      │
//! │        │     CommandTable                         │      │
//! │        │      (chords)                            ▼      │
//! │        └──────────── selection feedback queue ◄───┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Learning: Module Organization
//!
//! Each concern lives in its own file and the crate root re-exports
//! the types callers need, so `chordal_core::CommandReader` works
//! without knowing the module layout.

pub mod builtins;
pub mod command;
pub mod config;
pub mod document;
pub mod edit;
pub mod event;
pub mod history;
pub mod keymap;
pub mod mode;
pub mod reader;
pub mod shortcut;
pub mod table;

pub use command::{
    Action, Command, CommandContext, CommandId, CommandRecord, CommandRegistry, CommandThunk,
};
pub use config::{Config, ConfigError};
pub use document::{BufferHandle, Document, DocumentId};
pub use edit::{Edit, EditKind, modify};
pub use event::{EditorEvent, EventBus, EventHandler};
pub use history::{Execution, History, HistoryRecords};
pub use mode::{Fallback, Mode, ModeKind, Resolution};
pub use reader::{CommandReader, Dispatch, InputEvent, InputHandle};
pub use shortcut::{Key, Modifiers, RawKeyEvent, Shortcut, normalize};
pub use table::{CommandTable, KeystrokeResult};

use shortcut::sequence_to_string;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No binding for {}", sequence_to_string(.0))]
    NotFound(Vec<Shortcut>),

    #[error("Nothing to undo")]
    NoMoreUndo,

    #[error("Nothing to redo")]
    NoMoreRedo,

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("No document bound to the active mode")]
    DocumentNil,

    #[error("Buffer error: {0}")]
    Buffer(#[from] chordal_buffer::BufferError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Invalid shortcut: {0}")]
    InvalidShortcut(String),

    #[error("Input queue closed")]
    InputClosed,
}

impl CoreError {
    /// Returns true for failures that are part of normal use, such as
    /// undoing past the start of history.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::NoMoreUndo | CoreError::NoMoreRedo)
    }
}
