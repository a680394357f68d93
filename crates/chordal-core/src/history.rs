//! Undo/redo history management.
//!
//! ## Learning: Grouping by Time
//!
//! Commands are not merged when recorded. Each keystroke stays its own
//! command; grouping is decided when undoing. Starting from the most
//! recent command, a group keeps growing while each command was executed
//! less than `max_delta` apart from its neighbour. Typing a word quickly
//! therefore undoes as one step, while a pause splits it.
//!
//! ## Learning: VecDeque
//!
//! Both stacks are `VecDeque`s with the most recent command at the
//! front, so the same grouping code works on either stack and the
//! oldest command can be dropped from the back when the limit is hit.

use chordal_buffer::TextStorage;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::command::{Action, Command, CommandRecord};
use crate::{CoreError, CoreResult};

/// What happened to a pushed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Applied and recorded on the undo stack
    Recorded,
    /// Ran without entering history
    Transient,
    /// An undo ran; this many commands moved to the redo stack
    Undone(usize),
    /// A redo ran; this many commands moved back to the undo stack
    Redone(usize),
}

/// Snapshot of both stacks, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecords {
    pub undo: Vec<CommandRecord>,
    pub redo: Vec<CommandRecord>,
}

/// Returns true if two commands ran close enough to share a group.
fn within(a: Instant, b: Instant, max_delta: Duration) -> bool {
    a.max(b).duration_since(a.min(b)) < max_delta
}

/// Number of commands at the front of `stack` forming one group.
fn group_len(stack: &VecDeque<Command>, max_delta: Duration) -> usize {
    if stack.is_empty() {
        return 0;
    }
    let chained = stack
        .iter()
        .zip(stack.iter().skip(1))
        .take_while(|(a, b)| within(a.executed_at(), b.executed_at(), max_delta))
        .count();
    chained + 1
}

/// Which stack to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stack {
    Undo,
    Redo,
}

/// Manages undo/redo history.
///
/// ## Design Decisions
///
/// 1. **Linear history**: recording a new edit discards the redo stack
/// 2. **Group-atomic undo**: a group is undone or redone as a unit
/// 3. **Bounded history**: the oldest commands fall off past `limit`
#[derive(Debug)]
pub struct History {
    /// Undoable commands, most recent first
    undo_stack: VecDeque<Command>,
    /// Redoable commands, most recently undone first
    redo_stack: VecDeque<Command>,
    /// Maximum number of undoable commands (0 = unbounded)
    limit: usize,
}

impl History {
    /// Creates a history keeping at most `limit` commands (0 = unbounded).
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            limit,
        }
    }

    /// Executes a command and records it if it is reversible.
    ///
    /// Undo and redo commands act on this history. A failed edit leaves
    /// both stacks untouched.
    pub fn push(&mut self, command: Command, storage: &mut dyn TextStorage) -> CoreResult<Execution> {
        match command.action() {
            Action::Undo { max_delta } => {
                let max_delta = *max_delta;
                self.undo_next_group(max_delta, storage).map(Execution::Undone)
            }
            Action::Redo { max_delta } => {
                let max_delta = *max_delta;
                self.redo_next_group(max_delta, storage).map(Execution::Redone)
            }
            Action::Noop => Ok(Execution::Transient),
            Action::Edit(_) => {
                command.forward(storage)?;
                self.redo_stack.clear();
                tracing::trace!(command = %command.name(), id = %command.id(), "Recorded");
                self.undo_stack.push_front(command);
                self.enforce_limit();
                Ok(Execution::Recorded)
            }
        }
    }

    /// Undoes the most recent group of commands.
    ///
    /// Returns the number of commands undone.
    pub fn undo_next_group(
        &mut self,
        max_delta: Duration,
        storage: &mut dyn TextStorage,
    ) -> CoreResult<usize> {
        let count = group_len(&self.undo_stack, max_delta);
        if count == 0 {
            return Err(CoreError::NoMoreUndo);
        }

        for _ in 0..count {
            let Some(command) = self.undo_stack.pop_front() else {
                break;
            };
            if let Err(err) = command.reverse(storage) {
                tracing::warn!(command = %command.name(), "Undo failed: {}", err);
                self.undo_stack.push_front(command);
                return Err(err);
            }
            self.redo_stack.push_front(command);
        }

        tracing::debug!(count, "Undid group");
        Ok(count)
    }

    /// Redoes the most recently undone group of commands.
    ///
    /// Returns the number of commands redone.
    pub fn redo_next_group(
        &mut self,
        max_delta: Duration,
        storage: &mut dyn TextStorage,
    ) -> CoreResult<usize> {
        let count = group_len(&self.redo_stack, max_delta);
        if count == 0 {
            return Err(CoreError::NoMoreRedo);
        }

        for _ in 0..count {
            let Some(command) = self.redo_stack.pop_front() else {
                break;
            };
            if let Err(err) = command.forward(storage) {
                tracing::warn!(command = %command.name(), "Redo failed: {}", err);
                self.redo_stack.push_front(command);
                return Err(err);
            }
            self.undo_stack.push_front(command);
        }
        self.enforce_limit();

        tracing::debug!(count, "Redid group");
        Ok(count)
    }

    /// Size of the group the next undo or redo would move.
    pub fn peek_group_len(&self, stack: Stack, max_delta: Duration) -> usize {
        match stack {
            Stack::Undo => group_len(&self.undo_stack, max_delta),
            Stack::Redo => group_len(&self.redo_stack, max_delta),
        }
    }

    /// Returns true if there's something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there's something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Returns the number of undoable commands.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns the number of redoable commands.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Changes the limit, dropping the oldest commands if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.enforce_limit();
    }

    /// Clears all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Iterates over the undo stack, most recent first.
    pub fn undo_stack(&self) -> impl Iterator<Item = &Command> {
        self.undo_stack.iter()
    }

    /// Iterates over the redo stack, next to redo first.
    pub fn redo_stack(&self) -> impl Iterator<Item = &Command> {
        self.redo_stack.iter()
    }

    /// Serializable snapshot of both stacks.
    pub fn records(&self) -> HistoryRecords {
        HistoryRecords {
            undo: self.undo_stack.iter().map(Command::record).collect(),
            redo: self.redo_stack.iter().map(Command::record).collect(),
        }
    }

    fn enforce_limit(&mut self) {
        if self.limit == 0 {
            return;
        }
        while self.undo_stack.len() > self.limit {
            if let Some(dropped) = self.undo_stack.pop_back() {
                tracing::trace!(command = %dropped.name(), "Dropped from history");
            }
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(1000)
    }
}
