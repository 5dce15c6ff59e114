// Keytrap Modifier System
// The four combo modifiers and their set representation

use std::fmt;

use bitflags::bitflags;
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::key::{Key, NamedKey};

/// A keyboard combo modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Modifier {
    Shift,
    Ctrl,
    Alt,
    Meta,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [Modifier::Shift, Modifier::Ctrl, Modifier::Alt, Modifier::Meta];

    /// The modifier a key represents, if it is a modifier key.
    pub fn from_key(key: Key) -> Option<Modifier> {
        match key {
            Key::Named(NamedKey::Shift) => Some(Modifier::Shift),
            Key::Named(NamedKey::Ctrl) => Some(Modifier::Ctrl),
            Key::Named(NamedKey::Alt) => Some(Modifier::Alt),
            Key::Named(NamedKey::Meta) => Some(Modifier::Meta),
            _ => None,
        }
    }

    /// The key that represents this modifier.
    pub fn key(self) -> Key {
        match self {
            Modifier::Shift => Key::Named(NamedKey::Shift),
            Modifier::Ctrl => Key::Named(NamedKey::Ctrl),
            Modifier::Alt => Key::Named(NamedKey::Alt),
            Modifier::Meta => Key::Named(NamedKey::Meta),
        }
    }

    fn flag(self) -> ModifierSet {
        match self {
            Modifier::Shift => ModifierSet::SHIFT,
            Modifier::Ctrl => ModifierSet::CTRL,
            Modifier::Alt => ModifierSet::ALT,
            Modifier::Meta => ModifierSet::META,
        }
    }
}

/// Check if a key is one of the four modifier keys.
#[inline]
pub fn is_modifier_key(key: Key) -> bool {
    Modifier::from_key(key).is_some()
}

bitflags! {
    /// An unordered, duplicate-free set of modifiers.
    ///
    /// Equality is exact and order-independent by construction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierSet: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

impl ModifierSet {
    /// The set containing exactly one modifier.
    pub fn only(modifier: Modifier) -> Self {
        modifier.flag()
    }

    pub fn has(self, modifier: Modifier) -> bool {
        self.contains(modifier.flag())
    }

    /// Iterate the contained modifiers in canonical order.
    pub fn modifiers(self) -> impl Iterator<Item = Modifier> {
        Modifier::ALL.into_iter().filter(move |m| self.has(*m))
    }
}

impl From<Modifier> for ModifierSet {
    fn from(modifier: Modifier) -> Self {
        modifier.flag()
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ModifierSet::empty(), |set, m| set | m.flag())
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for modifier in self.modifiers() {
            if !first {
                write!(f, "+")?;
            }
            write!(f, "{}", modifier)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_modifier_from_key() {
        assert_eq!(
            Modifier::from_key(Key::Named(NamedKey::Ctrl)),
            Some(Modifier::Ctrl)
        );
        assert_eq!(Modifier::from_key(Key::Char('a')), None);
    }

    #[test]
    fn test_modifier_key_roundtrip() {
        for modifier in Modifier::ALL {
            assert_eq!(Modifier::from_key(modifier.key()), Some(modifier));
        }
    }

    #[test]
    fn test_is_modifier_key() {
        assert!(is_modifier_key(Key::Named(NamedKey::Shift)));
        assert!(is_modifier_key(Key::Named(NamedKey::Meta)));
        assert!(!is_modifier_key(Key::Named(NamedKey::Enter)));
        assert!(!is_modifier_key(Key::Char('a')));
    }

    #[test]
    fn test_modifier_from_str() {
        assert_eq!(Modifier::from_str("shift"), Ok(Modifier::Shift));
        assert_eq!(Modifier::from_str("meta"), Ok(Modifier::Meta));
        assert!(Modifier::from_str("hyper").is_err());
    }

    #[test]
    fn test_set_order_independent_equality() {
        let a: ModifierSet = [Modifier::Ctrl, Modifier::Shift].into_iter().collect();
        let b: ModifierSet = [Modifier::Shift, Modifier::Ctrl].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_no_duplicates() {
        let set: ModifierSet = [Modifier::Alt, Modifier::Alt].into_iter().collect();
        assert_eq!(set, ModifierSet::only(Modifier::Alt));
        assert_eq!(set.modifiers().count(), 1);
    }

    #[test]
    fn test_set_exactness() {
        let ctrl = ModifierSet::only(Modifier::Ctrl);
        let ctrl_shift = ctrl | ModifierSet::SHIFT;
        assert_ne!(ctrl, ctrl_shift);
        assert!(ctrl_shift.has(Modifier::Ctrl));
        assert!(!ctrl.has(Modifier::Shift));
    }

    #[test]
    fn test_set_display() {
        let set: ModifierSet = [Modifier::Meta, Modifier::Shift].into_iter().collect();
        assert_eq!(set.to_string(), "shift+meta");
        assert_eq!(ModifierSet::empty().to_string(), "");
    }
}
