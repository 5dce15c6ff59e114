// Keytrap Action Kind
// Which physical phase of a key press triggers a binding

use strum_macros::{Display, EnumString, IntoStaticStr};

/// The key-event phase a binding listens for.
///
/// `KeyPress` is the character phase: it carries the printable character
/// produced by the key, including the effect of shift. `KeyDown`/`KeyUp`
/// carry the hardware code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ActionKind {
    KeyDown,
    KeyUp,
    KeyPress,
}

impl ActionKind {
    /// Returns true for the hardware-code phases (keydown/keyup)
    pub fn is_code_phase(self) -> bool {
        matches!(self, ActionKind::KeyDown | ActionKind::KeyUp)
    }

    /// Returns true if this is the character phase
    pub fn is_keypress(self) -> bool {
        matches!(self, ActionKind::KeyPress)
    }

    /// Returns true if this is the release phase
    pub fn is_keyup(self) -> bool {
        matches!(self, ActionKind::KeyUp)
    }
}
