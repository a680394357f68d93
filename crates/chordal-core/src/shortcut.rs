//! Shortcut descriptors and input normalization.
//!
//! A [`Shortcut`] is a normalized key press: one key plus a modifier
//! set. Platform layers produce them from raw key events with
//! [`normalize`]; bindings are written as strings and read with
//! [`Shortcut::parse`].

use serde::{Deserialize, Serialize};

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool, // Cmd on macOS, Win on Windows
    pub caps_lock: bool,
    pub numeric_pad: bool,
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
        caps_lock: false,
        numeric_pad: false,
    };

    /// Ctrl modifier.
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    /// Alt (Option) modifier.
    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };

    /// Shift modifier.
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// Meta (Cmd/Win) modifier.
    pub const META: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };

    /// Caps Lock.
    pub const CAPS_LOCK: Modifiers = Modifiers {
        caps_lock: true,
        ..Modifiers::NONE
    };

    /// Key originated on the numeric keypad.
    pub const NUMERIC_PAD: Modifiers = Modifiers {
        numeric_pad: true,
        ..Modifiers::NONE
    };

    /// Returns true if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        *self == Modifiers::NONE
    }

    /// Parses a single modifier name such as `ctrl` or `cmd`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ctrl" | "control" | "c" => Some(Modifiers::CTRL),
            "alt" | "option" | "opt" | "m" => Some(Modifiers::ALT),
            "shift" | "s" => Some(Modifiers::SHIFT),
            "meta" | "cmd" | "command" | "super" | "win" => Some(Modifiers::META),
            "capslock" | "caps" => Some(Modifiers::CAPS_LOCK),
            "numpad" | "keypad" => Some(Modifiers::NUMERIC_PAD),
            _ => None,
        }
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl || rhs.ctrl,
            alt: self.alt || rhs.alt,
            shift: self.shift || rhs.shift,
            meta: self.meta || rhs.meta,
            caps_lock: self.caps_lock || rhs.caps_lock,
            numeric_pad: self.numeric_pad || rhs.numeric_pad,
        }
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        *self = *self | rhs;
    }
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            #[cfg(target_os = "macos")]
            parts.push("Cmd");
            #[cfg(not(target_os = "macos"))]
            parts.push("Meta");
        }
        if self.caps_lock {
            parts.push("CapsLock");
        }
        if self.numeric_pad {
            parts.push("NumPad");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// A key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8), // F1-F12
    Space,
}

impl Key {
    /// Maps a character delivered by the platform to a key.
    ///
    /// Control characters for Return, Tab, Escape and the two delete
    /// codes become named keys.
    pub fn from_char(c: char) -> Self {
        match c {
            '\r' | '\n' => Key::Enter,
            '\t' => Key::Tab,
            '\u{8}' | '\u{7f}' => Key::Backspace,
            '\u{1b}' => Key::Escape,
            ' ' => Key::Space,
            other => Key::Char(other),
        }
    }

    /// Parses a key from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Key::Char(c));
        }

        let lower = s.to_lowercase();
        match lower.as_str() {
            "enter" | "return" | "ret" => Some(Key::Enter),
            "tab" => Some(Key::Tab),
            "backspace" | "bs" => Some(Key::Backspace),
            "delete" | "del" => Some(Key::Delete),
            "escape" | "esc" => Some(Key::Escape),
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "home" => Some(Key::Home),
            "end" => Some(Key::End),
            "pageup" | "pgup" => Some(Key::PageUp),
            "pagedown" | "pgdn" => Some(Key::PageDown),
            "space" | "spc" => Some(Key::Space),
            _ if lower.starts_with('f') && lower.len() <= 3 => {
                lower[1..].parse().ok().filter(|n| (1..=12).contains(n)).map(Key::F)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Enter => write!(f, "Enter"),
            Key::Tab => write!(f, "Tab"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Delete => write!(f, "Delete"),
            Key::Escape => write!(f, "Escape"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
            Key::PageUp => write!(f, "PageUp"),
            Key::PageDown => write!(f, "PageDown"),
            Key::F(n) => write!(f, "F{}", n),
            Key::Space => write!(f, "Space"),
        }
    }
}

/// A normalized key press.
///
/// Compared and hashed by value, so it can key a command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shortcut {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Shortcut {
    /// Creates a new shortcut.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A character key with no modifiers.
    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::NONE)
    }

    /// A named key with no modifiers.
    pub fn key(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// Ctrl + character.
    pub fn ctrl(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::CTRL)
    }

    /// Meta (Cmd) + character.
    pub fn meta(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::META)
    }

    /// The character carried by the key, if it is a character key.
    pub fn character(&self) -> Option<char> {
        match self.key {
            Key::Char(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the character to insert if this is a plain alphanumeric key.
    pub fn self_insert_char(&self) -> Option<char> {
        self.character()
            .filter(|c| c.is_alphanumeric() && self.modifiers.is_empty())
    }

    /// Parses a shortcut like `ctrl+s`, `cmd+shift+z`, `backspace` or `ctrl++`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (mod_str, key_str) = if s == "+" {
            ("", "+")
        } else if let Some(prefix) = s.strip_suffix("++") {
            (prefix, "+")
        } else {
            s.rsplit_once('+').unwrap_or(("", s))
        };

        let key = Key::parse(key_str)?;
        let mut modifiers = Modifiers::NONE;
        for name in mod_str.split('+').filter(|name| !name.is_empty()) {
            modifiers |= Modifiers::from_name(name)?;
        }

        Some(Self { key, modifiers })
    }

    /// Parses a whitespace-separated chord such as `ctrl+x u`.
    pub fn parse_sequence(s: &str) -> Option<Vec<Self>> {
        let keys = s
            .split_whitespace()
            .map(Shortcut::parse)
            .collect::<Option<Vec<_>>>()?;
        (!keys.is_empty()).then_some(keys)
    }
}

impl std::fmt::Display for Shortcut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// Formats a key sequence as space-separated shortcuts.
pub fn sequence_to_string(keys: &[Shortcut]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

// ==================== Normalization ====================

/// Raw modifier bits as delivered by the platform event layer.
pub mod raw {
    pub const CAPS_LOCK: u64 = 1 << 16;
    pub const SHIFT: u64 = 1 << 17;
    pub const CONTROL: u64 = 1 << 18;
    pub const OPTION: u64 = 1 << 19;
    pub const COMMAND: u64 = 1 << 20;
    pub const NUMERIC_PAD: u64 = 1 << 21;
}

const RAW_MODIFIERS: [(u64, Modifiers); 6] = [
    (raw::CAPS_LOCK, Modifiers::CAPS_LOCK),
    (raw::SHIFT, Modifiers::SHIFT),
    (raw::CONTROL, Modifiers::CTRL),
    (raw::OPTION, Modifiers::ALT),
    (raw::COMMAND, Modifiers::META),
    (raw::NUMERIC_PAD, Modifiers::NUMERIC_PAD),
];

/// A key event before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawKeyEvent {
    /// Characters produced by the key, ignoring modifiers except shift
    pub characters: String,
    /// Platform modifier bit mask (see [`raw`])
    pub modifier_bits: u64,
}

impl RawKeyEvent {
    /// Creates a raw event.
    pub fn new(characters: impl Into<String>, modifier_bits: u64) -> Self {
        Self {
            characters: characters.into(),
            modifier_bits,
        }
    }
}

/// Converts a raw platform key event into a shortcut.
///
/// Only the first character is used. Shift and Caps Lock are folded
/// into character keys, since the character already reflects them;
/// named keys keep them (`shift+tab`). Unknown bits are ignored.
/// Returns `None` for events that carry no character.
pub fn normalize(event: &RawKeyEvent) -> Option<Shortcut> {
    let first = event.characters.chars().next()?;
    let key = Key::from_char(first);

    let mut modifiers = RAW_MODIFIERS
        .iter()
        .filter(|(bit, _)| event.modifier_bits & bit != 0)
        .fold(Modifiers::NONE, |acc, (_, m)| acc | *m);

    if matches!(key, Key::Char(_)) {
        modifiers.shift = false;
        modifiers.caps_lock = false;
    }

    Some(Shortcut { key, modifiers })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_parse() {
        let s = Shortcut::parse("ctrl+s").unwrap();
        assert_eq!(s.key, Key::Char('s'));
        assert!(s.modifiers.ctrl);

        let s = Shortcut::parse("cmd+shift+z").unwrap();
        assert_eq!(s.modifiers, Modifiers::META | Modifiers::SHIFT);
    }

    #[test]
    fn test_single_letters_are_chars() {
        assert_eq!(Shortcut::parse("f"), Some(Shortcut::char('f')));
        assert_eq!(Shortcut::parse("F"), Some(Shortcut::char('F')));
        assert_eq!(Shortcut::parse("f5"), Some(Shortcut::key(Key::F(5))));
    }

    #[test]
    fn test_plus_key() {
        assert_eq!(Shortcut::parse("+"), Some(Shortcut::char('+')));
        assert_eq!(Shortcut::parse("ctrl++"), Some(Shortcut::ctrl('+')));
    }

    #[test]
    fn test_unknown_modifier_is_rejected() {
        assert!(Shortcut::parse("hyper+x").is_none());
        assert!(Shortcut::parse("ctrl+nosuchkey").is_none());
    }

    #[test]
    fn test_parse_sequence() {
        let keys = Shortcut::parse_sequence("ctrl+x  u").unwrap();
        assert_eq!(keys, vec![Shortcut::ctrl('x'), Shortcut::char('u')]);
        assert!(Shortcut::parse_sequence("   ").is_none());
        assert_eq!(sequence_to_string(&keys), "Ctrl+x u");
    }

    #[test]
    fn test_self_insert_char() {
        assert_eq!(Shortcut::char('a').self_insert_char(), Some('a'));
        assert_eq!(Shortcut::char('7').self_insert_char(), Some('7'));
        assert_eq!(Shortcut::char('é').self_insert_char(), Some('é'));
        assert_eq!(Shortcut::char(';').self_insert_char(), None);
        assert_eq!(Shortcut::ctrl('a').self_insert_char(), None);
        assert_eq!(Shortcut::key(Key::Space).self_insert_char(), None);
    }

    #[test]
    fn test_normalize_maps_modifier_bits() {
        let event = RawKeyEvent::new("z", raw::COMMAND | raw::CONTROL);
        let shortcut = normalize(&event).unwrap();
        assert_eq!(shortcut.key, Key::Char('z'));
        assert_eq!(shortcut.modifiers, Modifiers::META | Modifiers::CTRL);
    }

    #[test]
    fn test_normalize_folds_shift_into_characters() {
        let shortcut = normalize(&RawKeyEvent::new("H", raw::SHIFT | raw::CAPS_LOCK)).unwrap();
        assert_eq!(shortcut, Shortcut::char('H'));

        let shortcut = normalize(&RawKeyEvent::new("\t", raw::SHIFT)).unwrap();
        assert_eq!(shortcut, Shortcut::new(Key::Tab, Modifiers::SHIFT));
    }

    #[test]
    fn test_normalize_named_keys() {
        assert_eq!(
            normalize(&RawKeyEvent::new("\u{7f}", 0)),
            Some(Shortcut::key(Key::Backspace))
        );
        assert_eq!(normalize(&RawKeyEvent::new("", raw::COMMAND)), None);
    }
}
