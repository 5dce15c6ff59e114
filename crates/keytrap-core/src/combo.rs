// Keytrap Combo Type
// A fully resolved (key, modifiers, action) binding descriptor

use std::fmt;

use crate::action::ActionKind;
use crate::key::Key;
use crate::modifier::ModifierSet;

/// One resolved combination: the canonical key, the exact modifier set
/// that must be held, and the event phase that triggers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Combo {
    pub key: Key,
    pub modifiers: ModifierSet,
    pub action: ActionKind,
}

impl Combo {
    pub fn new(key: Key, modifiers: ModifierSet, action: ActionKind) -> Self {
        Self {
            key,
            modifiers,
            action,
        }
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}
