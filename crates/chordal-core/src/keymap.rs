//! Default key bindings and config-driven table construction.
//!
//! Bindings are written as `(key sequence, command name)` pairs; the
//! [`CommandRegistry`] turns names into producers and the
//! [`CommandTable`] turns sequences into nested prefix tables.

use crate::command::CommandRegistry;
use crate::config::{Config, ConfigError};
use crate::shortcut::Shortcut;
use crate::table::CommandTable;

/// Bindings installed before any from the config file.
pub const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("cmd+z", "undo"),
    ("cmd+r", "redo"),
    ("backspace", "delete-backward-char"),
    ("ctrl+d", "delete-forward-char"),
    ("delete", "delete-forward-char"),
    ("enter", "newline"),
    ("space", "insert-space"),
    ("ctrl+g", "keyboard-quit"),
    ("ctrl+x u", "undo"),
    ("ctrl+x r", "redo"),
];

/// Binds one `(sequence, command)` pair into `table`.
pub fn bind(
    table: &mut CommandTable,
    registry: &CommandRegistry,
    sequence: &str,
    command: &str,
) -> Result<(), ConfigError> {
    let keys = Shortcut::parse_sequence(sequence)
        .ok_or_else(|| ConfigError::InvalidBinding(sequence.to_string()))?;
    let thunk = registry
        .get(command)
        .ok_or_else(|| ConfigError::UnknownCommand {
            binding: sequence.to_string(),
            command: command.to_string(),
        })?;

    table
        .bind_sequence(&keys, thunk)
        .map_err(|_| ConfigError::InvalidBinding(sequence.to_string()))?;
    tracing::trace!(sequence, command, "Bound");
    Ok(())
}

/// Builds a table from `bindings`, in order.
pub fn build_table<'a>(
    name: &str,
    registry: &CommandRegistry,
    bindings: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<CommandTable, ConfigError> {
    let mut table = CommandTable::new(name, "");
    for (sequence, command) in bindings {
        bind(&mut table, registry, sequence, command)?;
    }
    Ok(table)
}

/// The default table, without config overrides.
pub fn default_table(registry: &CommandRegistry) -> Result<CommandTable, ConfigError> {
    build_table("global", registry, DEFAULT_BINDINGS.iter().copied())
}

/// The default table with the config's bindings applied on top.
pub fn table_from_config(
    config: &Config,
    registry: &CommandRegistry,
) -> Result<CommandTable, ConfigError> {
    let mut table = default_table(registry)?;
    for (sequence, command) in &config.keyboard.bindings {
        bind(&mut table, registry, sequence, command)?;
    }
    tracing::debug!(
        custom = config.keyboard.bindings.len(),
        total = table.len(),
        "Keymap loaded"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcut::Key;
    use crate::table::KeystrokeResult;

    #[test]
    fn test_defaults_parse() {
        let registry = CommandRegistry::with_builtins();
        let table = default_table(&registry).unwrap();
        assert!(matches!(
            table.lookup(&Shortcut::meta('z')),
            Some(KeystrokeResult::Command(_))
        ));
        assert!(matches!(
            table.lookup(&Shortcut::ctrl('x')),
            Some(KeystrokeResult::Prefix(_))
        ));
        assert!(table.lookup(&Shortcut::key(Key::Backspace)).is_some());
        assert!(table.lookup(&Shortcut::key(Key::Space)).is_some());
    }

    #[test]
    fn test_config_overrides_defaults() {
        let registry = CommandRegistry::with_builtins();
        let mut config = Config::default();
        config
            .keyboard
            .bindings
            .insert("ctrl+x".to_string(), "undo".to_string());
        config
            .keyboard
            .bindings
            .insert("ctrl+c ctrl+c".to_string(), "keyboard-quit".to_string());

        let table = table_from_config(&config, &registry).unwrap();
        assert!(matches!(
            table.lookup(&Shortcut::ctrl('x')),
            Some(KeystrokeResult::Command(_))
        ));
        assert!(table
            .resolve_path(&[Shortcut::ctrl('c')])
            .is_some_and(|nested| nested.lookup(&Shortcut::ctrl('c')).is_some()));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let registry = CommandRegistry::with_builtins();
        let mut config = Config::default();
        config
            .keyboard
            .bindings
            .insert("ctrl+o".to_string(), "open-file".to_string());

        assert!(matches!(
            table_from_config(&config, &registry),
            Err(ConfigError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_bad_sequence_is_rejected() {
        let registry = CommandRegistry::with_builtins();
        let mut table = CommandTable::new("test", "");
        assert!(matches!(
            bind(&mut table, &registry, "hyper+q", "undo"),
            Err(ConfigError::InvalidBinding(_))
        ));
        assert!(matches!(
            bind(&mut table, &registry, "  ", "undo"),
            Err(ConfigError::InvalidBinding(_))
        ));
    }
}
