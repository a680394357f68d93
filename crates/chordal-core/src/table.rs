//! Command tables and chord prefixes.
//!
//! A [`CommandTable`] maps a shortcut to either a command producer or a
//! nested table. Nested tables are how chords like `ctrl+x u` work: the
//! first key selects the nested table, the second is looked up in it.

use std::collections::HashMap;

use crate::command::CommandThunk;
use crate::shortcut::Shortcut;
use crate::{CoreError, CoreResult};

/// What a shortcut resolves to inside one table.
#[derive(Clone)]
pub enum KeystrokeResult {
    /// Produce a command
    Command(CommandThunk),
    /// Wait for the next key and look it up here
    Prefix(CommandTable),
}

impl std::fmt::Debug for KeystrokeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeystrokeResult::Command(_) => f.write_str("Command(..)"),
            KeystrokeResult::Prefix(table) => f.debug_tuple("Prefix").field(table).finish(),
        }
    }
}

/// Shortcut bindings for one mode (or one chord prefix).
#[derive(Clone, Default)]
pub struct CommandTable {
    name: String,
    description: String,
    bindings: HashMap<Shortcut, KeystrokeResult>,
}

impl CommandTable {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            bindings: HashMap::new(),
        }
    }

    /// Creates the nested table reached through `key`.
    fn prefix_of(key: &Shortcut) -> Self {
        Self::new(format!("{}-prefix", key), format!("Keys following {}", key))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Binds `shortcut` to a command producer.
    ///
    /// Replaces whatever was bound before, including a nested table.
    pub fn define_shortcut(
        &mut self,
        shortcut: Shortcut,
        thunk: CommandThunk,
    ) -> Option<KeystrokeResult> {
        self.bindings.insert(shortcut, KeystrokeResult::Command(thunk))
    }

    /// Binds `shortcut` to a nested table.
    pub fn define_prefix(
        &mut self,
        shortcut: Shortcut,
        table: CommandTable,
    ) -> Option<KeystrokeResult> {
        self.bindings.insert(shortcut, KeystrokeResult::Prefix(table))
    }

    /// Binds a key sequence, creating nested tables along the way.
    ///
    /// A command bound to one of the leading keys is replaced by a
    /// nested table.
    pub fn bind_sequence(&mut self, keys: &[Shortcut], thunk: CommandThunk) -> CoreResult<()> {
        let Some((first, rest)) = keys.split_first() else {
            return Err(CoreError::InvalidShortcut("empty key sequence".to_string()));
        };

        if rest.is_empty() {
            self.define_shortcut(*first, thunk);
            return Ok(());
        }

        let entry = self
            .bindings
            .entry(*first)
            .or_insert_with(|| KeystrokeResult::Prefix(Self::prefix_of(first)));
        if !matches!(entry, KeystrokeResult::Prefix(_)) {
            tracing::debug!(shortcut = %first, "Replacing command binding with prefix");
            *entry = KeystrokeResult::Prefix(Self::prefix_of(first));
        }
        if let KeystrokeResult::Prefix(table) = entry {
            table.bind_sequence(rest, thunk)?;
        }
        Ok(())
    }

    /// Removes a binding.
    pub fn unbind(&mut self, shortcut: &Shortcut) -> Option<KeystrokeResult> {
        self.bindings.remove(shortcut)
    }

    /// Looks up a shortcut by exact equality.
    pub fn lookup(&self, shortcut: &Shortcut) -> Option<&KeystrokeResult> {
        self.bindings.get(shortcut)
    }

    /// Follows a chord prefix down to its nested table.
    ///
    /// An empty path is this table.
    pub fn resolve_path(&self, keys: &[Shortcut]) -> Option<&CommandTable> {
        keys.iter()
            .try_fold(self, |table, key| match table.lookup(key) {
                Some(KeystrokeResult::Prefix(nested)) => Some(nested),
                _ => None,
            })
    }

    /// Number of direct bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates over direct bindings in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Shortcut, &KeystrokeResult)> {
        self.bindings.iter()
    }
}

impl std::fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTable")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Looks up `shortcut` in the table reached by `pending` from `root`.
///
/// Returns `None` both when the key is unbound and when the pending
/// chord no longer leads to a table.
pub fn dispatch<'a>(
    root: &'a CommandTable,
    pending: &[Shortcut],
    shortcut: &Shortcut,
) -> Option<&'a KeystrokeResult> {
    let table = root.resolve_path(pending)?;
    tracing::trace!(table = %table.name(), shortcut = %shortcut, "Table lookup");
    table.lookup(shortcut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::command::thunk;

    fn undo() -> CommandThunk {
        thunk(builtins::undo)
    }

    #[test]
    fn test_define_shortcut_overwrites() {
        let mut table = CommandTable::new("test", "");
        assert!(table.define_shortcut(Shortcut::meta('z'), undo()).is_none());
        assert!(table.define_shortcut(Shortcut::meta('z'), undo()).is_some());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut table = CommandTable::new("test", "");
        table.define_shortcut(Shortcut::meta('z'), undo());
        assert!(table.lookup(&Shortcut::meta('z')).is_some());
        assert!(table.lookup(&Shortcut::char('z')).is_none());
        assert!(table.lookup(&Shortcut::ctrl('z')).is_none());
    }

    #[test]
    fn test_bind_sequence_creates_prefixes() {
        let mut table = CommandTable::new("test", "");
        table
            .bind_sequence(&[Shortcut::ctrl('x'), Shortcut::char('u')], undo())
            .unwrap();
        table
            .bind_sequence(&[Shortcut::ctrl('x'), Shortcut::char('r')], undo())
            .unwrap();

        let nested = table.resolve_path(&[Shortcut::ctrl('x')]).unwrap();
        assert_eq!(nested.len(), 2);
        assert!(matches!(
            dispatch(&table, &[Shortcut::ctrl('x')], &Shortcut::char('u')),
            Some(KeystrokeResult::Command(_))
        ));
        assert!(dispatch(&table, &[Shortcut::ctrl('x')], &Shortcut::char('q')).is_none());
    }

    #[test]
    fn test_sequence_replaces_command_with_prefix() {
        let mut table = CommandTable::new("test", "");
        table.define_shortcut(Shortcut::ctrl('x'), undo());
        table
            .bind_sequence(&[Shortcut::ctrl('x'), Shortcut::char('u')], undo())
            .unwrap();
        assert!(matches!(
            table.lookup(&Shortcut::ctrl('x')),
            Some(KeystrokeResult::Prefix(_))
        ));
    }

    #[test]
    fn test_define_prefix_installs_nested_table() {
        let mut nested = CommandTable::new("ctrl+c-prefix", "Comment keys");
        nested.define_shortcut(Shortcut::char('c'), undo());
        nested.define_shortcut(Shortcut::char('u'), undo());

        let mut table = CommandTable::new("test", "");
        assert!(table.define_prefix(Shortcut::ctrl('c'), nested).is_none());

        let reached = table.resolve_path(&[Shortcut::ctrl('c')]).unwrap();
        assert_eq!(reached.name(), "ctrl+c-prefix");
        assert_eq!(reached.len(), 2);
        assert!(matches!(
            dispatch(&table, &[Shortcut::ctrl('c')], &Shortcut::char('u')),
            Some(KeystrokeResult::Command(_))
        ));
        assert!(dispatch(&table, &[], &Shortcut::char('u')).is_none());
    }

    #[test]
    fn test_define_shortcut_replaces_prefix() {
        let mut nested = CommandTable::new("nested", "");
        nested.define_shortcut(Shortcut::char('u'), undo());

        let mut table = CommandTable::new("test", "");
        table.define_prefix(Shortcut::ctrl('c'), nested);
        let previous = table.define_shortcut(Shortcut::ctrl('c'), undo());

        assert!(matches!(previous, Some(KeystrokeResult::Prefix(_))));
        assert!(matches!(
            table.lookup(&Shortcut::ctrl('c')),
            Some(KeystrokeResult::Command(_))
        ));
        assert!(table.resolve_path(&[Shortcut::ctrl('c')]).is_none());
        assert!(dispatch(&table, &[Shortcut::ctrl('c')], &Shortcut::char('u')).is_none());
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let mut table = CommandTable::new("test", "");
        assert!(table.bind_sequence(&[], undo()).is_err());
    }

    #[test]
    fn test_resolve_path_through_command_fails() {
        let mut table = CommandTable::new("test", "");
        table.define_shortcut(Shortcut::ctrl('x'), undo());
        assert!(table.resolve_path(&[Shortcut::ctrl('x')]).is_none());
        assert!(table.resolve_path(&[]).is_some());
    }

    #[test]
    fn test_unbind() {
        let mut table = CommandTable::new("test", "");
        table.define_shortcut(Shortcut::meta('z'), undo());
        assert!(table.unbind(&Shortcut::meta('z')).is_some());
        assert!(table.is_empty());
    }
}
