// Keytrap Key Type
// Canonical identifier for one physical key, independent of shift state

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use strum_macros::{Display, EnumString, IntoStaticStr};

/// Special (non-character) keys with a fixed hardware-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum NamedKey {
    Backspace,
    Tab,
    Enter,
    Shift,
    Ctrl,
    Alt,
    CapsLock,
    Esc,
    Space,
    PageUp,
    PageDown,
    End,
    Home,
    Left,
    Up,
    Right,
    Down,
    Ins,
    Del,
    Meta,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
}

const F_KEYS: [NamedKey; 19] = [
    NamedKey::F1,
    NamedKey::F2,
    NamedKey::F3,
    NamedKey::F4,
    NamedKey::F5,
    NamedKey::F6,
    NamedKey::F7,
    NamedKey::F8,
    NamedKey::F9,
    NamedKey::F10,
    NamedKey::F11,
    NamedKey::F12,
    NamedKey::F13,
    NamedKey::F14,
    NamedKey::F15,
    NamedKey::F16,
    NamedKey::F17,
    NamedKey::F18,
    NamedKey::F19,
];

/// Canonical key identifier.
///
/// `Char` holds a printable character identity ('a', '*', '/'). `Named`
/// holds a special key. Identical physical keys always normalize to the
/// same `Key` regardless of the event phase that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Named(NamedKey),
}

impl Key {
    /// Whether this key has a fixed hardware-code mapping.
    ///
    /// Drives action inference: special keys default to keydown bindings,
    /// characters default to keypress.
    pub fn is_special(self) -> bool {
        matches!(self, Key::Named(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Named(n) => write!(f, "{}", n),
        }
    }
}

/// Fixed code table for the keydown/keyup path
fn code_map() -> &'static HashMap<u32, Key> {
    static CODE_MAP: OnceLock<HashMap<u32, Key>> = OnceLock::new();
    CODE_MAP.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert(8, Key::Named(NamedKey::Backspace));
        map.insert(9, Key::Named(NamedKey::Tab));
        map.insert(13, Key::Named(NamedKey::Enter));
        map.insert(16, Key::Named(NamedKey::Shift));
        map.insert(17, Key::Named(NamedKey::Ctrl));
        map.insert(18, Key::Named(NamedKey::Alt));
        map.insert(20, Key::Named(NamedKey::CapsLock));
        map.insert(27, Key::Named(NamedKey::Esc));
        map.insert(32, Key::Named(NamedKey::Space));
        map.insert(33, Key::Named(NamedKey::PageUp));
        map.insert(34, Key::Named(NamedKey::PageDown));
        map.insert(35, Key::Named(NamedKey::End));
        map.insert(36, Key::Named(NamedKey::Home));
        map.insert(37, Key::Named(NamedKey::Left));
        map.insert(38, Key::Named(NamedKey::Up));
        map.insert(39, Key::Named(NamedKey::Right));
        map.insert(40, Key::Named(NamedKey::Down));
        map.insert(45, Key::Named(NamedKey::Ins));
        map.insert(46, Key::Named(NamedKey::Del));
        // primary, right-side and alternate vendor codes all collapse to meta
        map.insert(91, Key::Named(NamedKey::Meta));
        map.insert(93, Key::Named(NamedKey::Meta));
        map.insert(224, Key::Named(NamedKey::Meta));
        for (i, fkey) in F_KEYS.iter().enumerate() {
            map.insert(112 + i as u32, Key::Named(*fkey));
        }
        // numeric keypad digits report their own codes
        for i in 0..=9u32 {
            map.insert(96 + i, Key::Char(char::from_digit(i, 10).unwrap()));
        }
        // keypad operators and layout-dependent punctuation codes
        map.insert(106, Key::Char('*'));
        map.insert(107, Key::Char('+'));
        map.insert(109, Key::Char('-'));
        map.insert(110, Key::Char('.'));
        map.insert(111, Key::Char('/'));
        map.insert(186, Key::Char(';'));
        map.insert(187, Key::Char('='));
        map.insert(188, Key::Char(','));
        map.insert(189, Key::Char('-'));
        map.insert(190, Key::Char('.'));
        map.insert(191, Key::Char('/'));
        map.insert(192, Key::Char('`'));
        map.insert(219, Key::Char('['));
        map.insert(220, Key::Char('\\'));
        map.insert(221, Key::Char(']'));
        map.insert(222, Key::Char('\''));
        map
    })
}

/// Translate a keydown/keyup hardware code into a canonical key.
///
/// Unknown codes fall back to the code's character, lowercased so that
/// the code phase and the character phase agree on one identity per
/// physical key. Codes with no printable character yield `None` and the
/// event is dropped.
pub fn key_from_code(code: u32) -> Option<Key> {
    if let Some(key) = code_map().get(&code) {
        return Some(*key);
    }
    let ch = char::from_u32(code)?;
    if ch.is_control() {
        return None;
    }
    let ch = ch.to_lowercase().next().unwrap_or(ch);
    Some(Key::Char(ch))
}

/// Look up a bind-time key token: a special-key name or a single character.
pub fn key_from_name(name: &str) -> Option<Key> {
    if let Ok(named) = NamedKey::from_str(&name.to_lowercase()) {
        return Some(Key::Named(named));
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(Key::Char(c)),
        _ => None,
    }
}

/// Map a character that requires shift on a US layout to its base key.
pub fn unshifted(ch: char) -> Option<char> {
    Some(match ch {
        '~' => '`',
        '!' => '1',
        '@' => '2',
        '#' => '3',
        '$' => '4',
        '%' => '5',
        '^' => '6',
        '&' => '7',
        '*' => '8',
        '(' => '9',
        ')' => '0',
        '_' => '-',
        '+' => '=',
        ':' => ';',
        '"' => '\'',
        '<' => ',',
        '>' => '.',
        '?' => '/',
        '|' => '\\',
        _ => return None,
    })
}
