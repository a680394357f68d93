//! Built-in commands.
//!
//! Every editing command here is a thin wrapper over [`modify`]: pick
//! the ranges, pick the replacement, capture the edit.

use chordal_buffer::TextSlice;

use crate::command::{Action, Command, CommandContext, CommandRegistry, CommandThunk, thunk};
use crate::edit::{backward_delete_ranges, forward_delete_ranges, modify};
use crate::CoreResult;

pub const SELF_INSERT: &str = "self-insert-command";
pub const INSERT_TEXT: &str = "insert-text";
pub const INSERT_SPACE: &str = "insert-space";
pub const DELETE_BACKWARD: &str = "delete-backward-char";
pub const DELETE_FORWARD: &str = "delete-forward-char";
pub const NEWLINE: &str = "newline";
pub const UNDO: &str = "undo";
pub const REDO: &str = "redo";
pub const KEYBOARD_QUIT: &str = "keyboard-quit";

/// Inserts `text` over the current selection.
fn insert(ctx: &CommandContext<'_>, name: &str, text: impl Into<TextSlice>) -> CoreResult<Command> {
    let edit = modify(ctx.storage, ctx.selections, text)?;
    Ok(Command::edit(name, edit, ctx.now))
}

/// Inserts a typed character at the selection.
pub fn self_insert(ctx: &CommandContext<'_>, c: char) -> CoreResult<Command> {
    insert(ctx, SELF_INSERT, c)
}

/// Returns a producer that inserts a fixed string.
pub fn insert_text(text: impl Into<String>) -> CommandThunk {
    let text: String = text.into();
    thunk(move |ctx| insert(ctx, INSERT_TEXT, text.as_str()))
}

pub fn insert_space(ctx: &CommandContext<'_>) -> CoreResult<Command> {
    insert(ctx, INSERT_SPACE, ' ')
}

pub fn newline(ctx: &CommandContext<'_>) -> CoreResult<Command> {
    insert(ctx, NEWLINE, '\n')
}

/// Deletes the character before the cursor, or the selection.
pub fn delete_backward_char(ctx: &CommandContext<'_>) -> CoreResult<Command> {
    let ranges = backward_delete_ranges(ctx.selections, ctx.storage.len());
    let edit = modify(ctx.storage, &ranges, TextSlice::new())?;
    Ok(Command::edit(DELETE_BACKWARD, edit, ctx.now))
}

/// Deletes the character after the cursor, or the selection.
pub fn delete_forward_char(ctx: &CommandContext<'_>) -> CoreResult<Command> {
    let ranges = forward_delete_ranges(ctx.selections, ctx.storage.len());
    let edit = modify(ctx.storage, &ranges, TextSlice::new())?;
    Ok(Command::edit(DELETE_FORWARD, edit, ctx.now))
}

pub fn undo(ctx: &CommandContext<'_>) -> CoreResult<Command> {
    Ok(Command::new(
        UNDO,
        "Undo the last group of edits",
        Action::Undo {
            max_delta: ctx.grouping_delta,
        },
        ctx.now,
    ))
}

pub fn redo(ctx: &CommandContext<'_>) -> CoreResult<Command> {
    Ok(Command::new(
        REDO,
        "Redo the last undone group of edits",
        Action::Redo {
            max_delta: ctx.grouping_delta,
        },
        ctx.now,
    ))
}

pub fn keyboard_quit(ctx: &CommandContext<'_>) -> CoreResult<Command> {
    Ok(Command::new(KEYBOARD_QUIT, "Cancel", Action::Noop, ctx.now))
}

/// Registers every built-in under its command name.
pub fn register_all(registry: &mut CommandRegistry) {
    registry.register(INSERT_SPACE, "Insert a space", thunk(insert_space));
    registry.register(NEWLINE, "Insert a line break", thunk(newline));
    registry.register(
        DELETE_BACKWARD,
        "Delete the previous character or the selection",
        thunk(delete_backward_char),
    );
    registry.register(
        DELETE_FORWARD,
        "Delete the next character or the selection",
        thunk(delete_forward_char),
    );
    registry.register(UNDO, "Undo the last group of edits", thunk(undo));
    registry.register(REDO, "Redo the last undone group of edits", thunk(redo));
    registry.register(KEYBOARD_QUIT, "Cancel the pending chord", thunk(keyboard_quit));
}
