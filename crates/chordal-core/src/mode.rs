//! Editing modes.
//!
//! A [`Mode`] is a command table plus a policy for keys the table does
//! not bind, together with the document and selections it edits.

use chordal_buffer::{BufferError, TextRange};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::builtins;
use crate::command::{Command, CommandContext};
use crate::document::Document;
use crate::shortcut::Shortcut;
use crate::table::{self, CommandTable, KeystrokeResult};
use crate::{CoreError, CoreResult};

/// What happens to a key the table does not bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fallback {
    /// Plain alphanumeric keys insert themselves
    SelfInsert,
    /// Unbound keys are errors
    None,
}

/// Predefined modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    /// Normal text editing
    #[default]
    Fundamental,
    /// Browsing: typing does not insert
    View,
}

impl ModeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModeKind::Fundamental => "Fundamental Mode",
            ModeKind::View => "View Mode",
        }
    }

    pub fn fallback(&self) -> Fallback {
        match self {
            ModeKind::Fundamental => Fallback::SelfInsert,
            ModeKind::View => Fallback::None,
        }
    }
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of resolving one key.
#[derive(Debug)]
pub enum Resolution {
    /// The key completed a binding
    Command(Command),
    /// The key starts (or continues) a chord
    Prefix,
}

/// The active editing policy.
#[derive(Debug)]
pub struct Mode {
    name: String,
    description: String,
    table: CommandTable,
    fallback: Fallback,
    selections: Vec<TextRange>,
    document: Option<Document>,
}

impl Mode {
    /// Creates a mode with an explicit table and fallback.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        table: CommandTable,
        fallback: Fallback,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            table,
            fallback,
            selections: vec![TextRange::cursor(0)],
            document: None,
        }
    }

    /// Creates one of the predefined modes.
    pub fn from_kind(kind: ModeKind, table: CommandTable) -> Self {
        let description = match kind {
            ModeKind::Fundamental => "Plain text editing",
            ModeKind::View => "Read-only browsing",
        };
        Self::new(kind.name(), description, table, kind.fallback())
    }

    pub fn fundamental(table: CommandTable) -> Self {
        Self::from_kind(ModeKind::Fundamental, table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn fallback(&self) -> Fallback {
        self.fallback
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut CommandTable {
        &mut self.table
    }

    /// Replaces the table, keeping document and selections.
    pub fn set_table(&mut self, table: CommandTable) {
        self.table = table;
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The selections edits act on, primary first.
    pub fn selections(&self) -> &[TextRange] {
        &self.selections
    }

    /// Binds the mode to a document and adopts its selections.
    pub fn bind(&mut self, document: Document) -> CoreResult<()> {
        let selections = document
            .buffer()
            .try_borrow()
            .map_err(|_| BufferError::TransactionInProgress)?
            .selections();
        self.selections = selections;
        self.document = Some(document);
        Ok(())
    }

    /// Detaches the document.
    pub fn unbind(&mut self) -> Option<Document> {
        self.document.take()
    }

    /// Stores the selections reported after a change.
    pub fn update_selections(&mut self, selections: Vec<TextRange>) {
        tracing::trace!(mode = %self.name, ?selections, "Selections updated");
        self.selections = selections;
    }

    /// Runs a command producer against the bound document.
    pub fn produce<F>(&self, now: Instant, grouping_delta: Duration, f: F) -> CoreResult<Command>
    where
        F: FnOnce(&CommandContext<'_>) -> CoreResult<Command>,
    {
        let document = self.document.as_ref().ok_or(CoreError::DocumentNil)?;
        let storage = document
            .buffer()
            .try_borrow()
            .map_err(|_| BufferError::TransactionInProgress)?;
        let ctx = CommandContext {
            storage: &*storage,
            selections: &self.selections,
            now,
            grouping_delta,
        };
        f(&ctx)
    }

    /// Resolves `shortcut`, typed after the chord keys in `pending`.
    ///
    /// Inside a chord there is no fallback: an unbound key is an error.
    pub fn resolve(
        &self,
        pending: &[Shortcut],
        shortcut: &Shortcut,
        now: Instant,
        grouping_delta: Duration,
    ) -> CoreResult<Resolution> {
        if self.document.is_none() {
            return Err(CoreError::DocumentNil);
        }

        match table::dispatch(&self.table, pending, shortcut) {
            Some(KeystrokeResult::Prefix(_)) => Ok(Resolution::Prefix),
            Some(KeystrokeResult::Command(thunk)) => self
                .produce(now, grouping_delta, |ctx| thunk(ctx))
                .map(Resolution::Command),
            None => match shortcut.self_insert_char() {
                Some(c) if pending.is_empty() && self.fallback == Fallback::SelfInsert => self
                    .produce(now, grouping_delta, |ctx| builtins::self_insert(ctx, c))
                    .map(Resolution::Command),
                _ => {
                    let mut keys = pending.to_vec();
                    keys.push(*shortcut);
                    Err(CoreError::NotFound(keys))
                }
            },
        }
    }
}
