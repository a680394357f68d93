//! Commands and the command registry.
//!
//! ## Learning: The Command Pattern
//!
//! A [`Command`] pairs a forward action with its inverse:
//! - The action is plain data ([`Action`]), not a closure
//! - The inverse is computed from the data, never stored separately
//! - History moves commands between stacks by value
//!
//! ## Trait Objects vs Enums
//!
//! Built-in *actions* are an enum (exhaustive, no allocation). Command
//! *producers* are trait objects ([`CommandThunk`]) so tables can bind
//! any function that inspects the buffer and returns a command.

use chordal_buffer::{TextRange, TextSlice, TextStorage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::builtins;
use crate::edit::{Edit, EditKind};
use crate::CoreResult;

/// Unique identifier for an executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(Uuid);

impl CommandId {
    /// Creates a new unique command ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a command does when executed.
///
/// Only [`Action::Edit`] has an inverse. The others run and are
/// forgotten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace a range of the buffer
    Edit(Edit),
    /// Undo the next group of commands
    Undo { max_delta: Duration },
    /// Redo the next group of commands
    Redo { max_delta: Duration },
    /// Do nothing (cancels a pending chord)
    Noop,
}

impl Action {
    /// Returns the inverse action, if there is one.
    pub fn inverse(&self) -> Option<Action> {
        match self {
            Action::Edit(edit) => Some(Action::Edit(edit.inverse())),
            _ => None,
        }
    }
}

/// An executed (or about to be executed) unit of work.
///
/// Commands are compared by id, not content: typing the same letter
/// twice produces two distinct commands. They are deliberately not
/// `Clone`, so a command lives in exactly one history stack.
#[derive(Debug)]
pub struct Command {
    id: CommandId,
    name: String,
    description: String,
    executed_at: Instant,
    action: Action,
}

impl Command {
    /// Creates a command stamped with `executed_at`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        action: Action,
        executed_at: Instant,
    ) -> Self {
        Self {
            id: CommandId::new(),
            name: name.into(),
            description: description.into(),
            executed_at,
            action,
        }
    }

    /// Creates an edit command.
    pub fn edit(name: impl Into<String>, edit: Edit, executed_at: Instant) -> Self {
        let description = match edit.kind {
            EditKind::Insert => format!("Insert {:?}", edit.inserted.text()),
            EditKind::Delete => format!("Delete {}", edit.range),
            EditKind::Replace => format!("Replace {} with {:?}", edit.range, edit.inserted.text()),
        };
        Self::new(name, description, Action::Edit(edit), executed_at)
    }

    #[inline]
    pub fn id(&self) -> CommandId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn executed_at(&self) -> Instant {
        self.executed_at
    }

    #[inline]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Returns the edit, for edit commands.
    pub fn as_edit(&self) -> Option<&Edit> {
        match &self.action {
            Action::Edit(edit) => Some(edit),
            _ => None,
        }
    }

    /// Returns true if the command has an inverse and belongs in history.
    pub fn is_reversible(&self) -> bool {
        self.action.inverse().is_some()
    }

    /// Re-applies the forward edit. Other actions do nothing here;
    /// history handles undo and redo itself.
    pub fn forward(&self, storage: &mut dyn TextStorage) -> CoreResult<()> {
        match &self.action {
            Action::Edit(edit) => edit.apply(storage),
            _ => Ok(()),
        }
    }

    /// Applies the inverse edit, restoring the state before `forward`.
    pub fn reverse(&self, storage: &mut dyn TextStorage) -> CoreResult<()> {
        match &self.action {
            Action::Edit(edit) => edit.inverse().apply(storage),
            _ => Ok(()),
        }
    }

    /// A serializable snapshot of the command.
    pub fn record(&self) -> CommandRecord {
        let edit = self.as_edit();
        CommandRecord {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            kind: edit.map(|e| e.kind),
            range: edit.map(|e| e.range),
            inserted: edit.map(|e| e.inserted.clone()),
            removed: edit.map(|e| e.removed.clone()),
        }
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Command {}

/// By-value view of a command for inspection and dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: CommandId,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<EditKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted: Option<TextSlice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<TextSlice>,
}

/// Everything a command producer may look at.
///
/// The buffer is borrowed read-only: producers describe an edit, they
/// never perform it.
pub struct CommandContext<'a> {
    /// The active buffer
    pub storage: &'a dyn TextStorage,
    /// The mode's current selections, primary first
    pub selections: &'a [TextRange],
    /// Timestamp for the produced command
    pub now: Instant,
    /// Grouping window for undo/redo commands
    pub grouping_delta: Duration,
}

/// A function producing a command from the current context.
///
/// ## Learning: `Arc<dyn Fn>`
///
/// Tables are cloned when chords are built, so producers are shared
/// with `Arc` rather than boxed. `Send + Sync` lets a table be built on
/// one thread and used on another.
pub type CommandThunk = Arc<dyn Fn(&CommandContext<'_>) -> CoreResult<Command> + Send + Sync>;

/// Wraps a function as a [`CommandThunk`].
pub fn thunk<F>(f: F) -> CommandThunk
where
    F: Fn(&CommandContext<'_>) -> CoreResult<Command> + Send + Sync + 'static,
{
    Arc::new(f)
}

struct RegisteredCommand {
    description: String,
    thunk: CommandThunk,
}

/// Registry of named commands.
///
/// Config files bind shortcuts to names; the registry turns those names
/// into producers.
pub struct CommandRegistry {
    commands: HashMap<String, RegisteredCommand>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry);
        registry
    }

    /// Registers a command, replacing any previous one with that name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        thunk: CommandThunk,
    ) {
        self.commands.insert(
            name.into(),
            RegisteredCommand {
                description: description.into(),
                thunk,
            },
        );
    }

    /// Looks up a command producer by name.
    pub fn get(&self, name: &str) -> Option<CommandThunk> {
        self.commands.get(name).map(|c| Arc::clone(&c.thunk))
    }

    /// Returns the description of a registered command.
    pub fn description(&self, name: &str) -> Option<&str> {
        self.commands.get(name).map(|c| c.description.as_str())
    }

    /// Returns true if a command with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
