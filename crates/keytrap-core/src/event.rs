// Keytrap Event Layer
// Raw key events and the normalizer producing canonical triples
//
// This is the only module that inspects raw event shape; everything
// downstream works on NormalizedKey.

use std::cell::Cell;

use crate::action::ActionKind;
use crate::key::{self, Key, NamedKey};
use crate::modifier::{Modifier, ModifierSet};
use crate::target::Element;

/// A raw key event as delivered by the host: an event phase, a numeric
/// payload (`which`: hardware code for keydown/keyup, character code for
/// keypress), the four modifier flags and an optional target element.
#[derive(Debug)]
pub struct KeyEvent {
    phase: ActionKind,
    which: u32,
    shift: bool,
    ctrl: bool,
    alt: bool,
    meta: bool,
    target: Option<Element>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl KeyEvent {
    fn new(phase: ActionKind, which: u32) -> Self {
        Self {
            phase,
            which,
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
            target: None,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn key_down(code: u32) -> Self {
        Self::new(ActionKind::KeyDown, code)
    }

    pub fn key_up(code: u32) -> Self {
        Self::new(ActionKind::KeyUp, code)
    }

    pub fn key_press(ch: char) -> Self {
        Self::new(ActionKind::KeyPress, ch as u32)
    }

    /// A targetless event with no payload, used by programmatic trigger.
    pub fn synthetic(phase: ActionKind) -> Self {
        Self::new(phase, 0)
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_modifiers(mut self, modifiers: ModifierSet) -> Self {
        self.shift = modifiers.has(Modifier::Shift);
        self.ctrl = modifiers.has(Modifier::Ctrl);
        self.alt = modifiers.has(Modifier::Alt);
        self.meta = modifiers.has(Modifier::Meta);
        self
    }

    pub fn with_target(mut self, target: Element) -> Self {
        self.target = Some(target);
        self
    }

    pub fn phase(&self) -> ActionKind {
        self.phase
    }

    pub fn which(&self) -> u32 {
        self.which
    }

    pub fn shift_key(&self) -> bool {
        self.shift
    }

    pub fn ctrl_key(&self) -> bool {
        self.ctrl
    }

    pub fn alt_key(&self) -> bool {
        self.alt
    }

    pub fn meta_key(&self) -> bool {
        self.meta
    }

    pub fn target(&self) -> Option<&Element> {
        self.target.as_ref()
    }

    /// The active-modifier set read off the event flags.
    pub fn modifiers(&self) -> ModifierSet {
        let mut set = ModifierSet::empty();
        if self.shift {
            set |= ModifierSet::SHIFT;
        }
        if self.ctrl {
            set |= ModifierSet::CTRL;
        }
        if self.alt {
            set |= ModifierSet::ALT;
        }
        if self.meta {
            set |= ModifierSet::META;
        }
        set
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

/// The canonical triple a raw event normalizes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedKey {
    pub key: Key,
    pub modifiers: ModifierSet,
    pub phase: ActionKind,
}

/// Normalize a raw event.
///
/// keydown/keyup translate the hardware code through the fixed table;
/// keypress uses the character payload as-is, lowercased when shift is
/// not held so a stuck caps lock does not break bindings. Events with no
/// derivable printable identifier return `None` and are dropped.
pub fn normalize(event: &KeyEvent) -> Option<NormalizedKey> {
    let key = match event.phase() {
        ActionKind::KeyPress => {
            let ch = char::from_u32(event.which())?;
            if ch.is_control() {
                return None;
            }
            let ch = if event.shift_key() {
                ch
            } else {
                ch.to_lowercase().next().unwrap_or(ch)
            };
            if ch == ' ' {
                Key::Named(NamedKey::Space)
            } else {
                Key::Char(ch)
            }
        }
        _ => key::key_from_code(event.which())?,
    };

    Some(NormalizedKey {
        key,
        modifiers: event.modifiers(),
        phase: event.phase(),
    })
}
