// Keytrap Combination Parser
// User combo strings -> resolved Combo descriptors and sequences

use smallvec::{smallvec, SmallVec};

use crate::action::ActionKind;
use crate::combo::Combo;
use crate::key::{self, Key};
use crate::modifier::{Modifier, ModifierSet};
use crate::settings::Platform;

/// Combination parser errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComboParseError {
    #[error("empty combination string")]
    Empty,
}

/// Result of parsing one user-supplied combination string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCombo {
    Single(Combo),
    /// Space-separated steps, in press order.
    Sequence(Vec<Combo>),
}

/// Collapse whitespace runs to single spaces.
///
/// The collapsed form is also the canonical sequence name used by the
/// dispatcher's level counters.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a combination string such as `"command+shift+o"`, `"*"` or
/// `"g i"` into one descriptor or an ordered sequence of descriptors.
///
/// `action` is the caller-requested phase; when absent each step infers
/// its own. Unknown key tokens never fail: they fall back to the first
/// character of the uppercased token, which typically produces a binding
/// that can never match (a diagnostic is logged in debug builds).
pub fn parse_combo(
    input: &str,
    action: Option<ActionKind>,
    platform: Platform,
) -> Result<ParsedCombo, ComboParseError> {
    let collapsed = collapse_whitespace(input);
    if collapsed.is_empty() {
        return Err(ComboParseError::Empty);
    }

    let steps: SmallVec<[&str; 4]> = collapsed.split(' ').collect();
    if steps.len() > 1 {
        let combos = steps
            .iter()
            .map(|step| parse_single(step, action, platform))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ParsedCombo::Sequence(combos));
    }

    parse_single(&collapsed, action, platform).map(ParsedCombo::Single)
}

/// Parse one step (no whitespace) into a Combo.
fn parse_single(
    combo: &str,
    action: Option<ActionKind>,
    platform: Platform,
) -> Result<Combo, ComboParseError> {
    let tokens = split_tokens(combo);
    let mut modifiers = ModifierSet::empty();
    let mut key = None;

    for token in tokens {
        let token = resolve_alias(token, platform);
        let mut resolved = lookup_token(token);

        // characters that need shift on a US layout are rewritten to
        // their base key, but keypress events deliver the shifted
        // character directly and must not double-count shift
        if let Some(explicit) = action {
            if explicit != ActionKind::KeyPress {
                if let Key::Char(c) = resolved {
                    if let Some(base) = key::unshifted(c) {
                        resolved = Key::Char(base);
                        modifiers |= ModifierSet::SHIFT;
                    }
                }
            }
        }

        if let Some(modifier) = Modifier::from_key(resolved) {
            modifiers |= ModifierSet::only(modifier);
        }
        key = Some(resolved);
    }

    let key = key.ok_or(ComboParseError::Empty)?;
    let action = pick_best_action(key, modifiers, action);
    Ok(Combo::new(key, modifiers, action))
}

/// Split a step on `+`, special-casing the literal plus key.
fn split_tokens(combo: &str) -> SmallVec<[&str; 4]> {
    if !combo.is_empty() && combo.chars().all(|c| c == '+') {
        return smallvec!["+"];
    }
    combo.split('+').filter(|t| !t.is_empty()).collect()
}

/// Resolve combo aliases; `mod` resolves per host platform.
fn resolve_alias(token: &str, platform: Platform) -> &str {
    if token.eq_ignore_ascii_case("option") {
        "alt"
    } else if token.eq_ignore_ascii_case("command") {
        "meta"
    } else if token.eq_ignore_ascii_case("return") {
        "enter"
    } else if token.eq_ignore_ascii_case("escape") {
        "esc"
    } else if token.eq_ignore_ascii_case("plus") {
        "+"
    } else if token.eq_ignore_ascii_case("mod") {
        if platform.is_mac() {
            "meta"
        } else {
            "ctrl"
        }
    } else {
        token
    }
}

/// Resolve a key token, falling back to the first character of the
/// uppercased token when the name is unknown.
fn lookup_token(token: &str) -> Key {
    if let Some(key) = key::key_from_name(token) {
        return key;
    }
    // non-throwing for compatibility: the resulting binding usually
    // never matches anything
    let fallback = token
        .to_uppercase()
        .chars()
        .next()
        .expect("split_tokens yields non-empty tokens");
    log::debug!(
        "unknown key token '{}' treated as literal '{}'",
        token,
        fallback
    );
    Key::Char(fallback)
}

/// Infer the best action when the caller did not specify one.
fn pick_best_action(key: Key, modifiers: ModifierSet, action: Option<ActionKind>) -> ActionKind {
    let action = action.unwrap_or(if key.is_special() {
        ActionKind::KeyDown
    } else {
        ActionKind::KeyPress
    });

    // keypress cannot reliably report modifier state
    if action == ActionKind::KeyPress && !modifiers.is_empty() {
        return ActionKind::KeyDown;
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::NamedKey;

    fn single(input: &str, action: Option<ActionKind>) -> Combo {
        match parse_combo(input, action, Platform::Other).unwrap() {
            ParsedCombo::Single(c) => c,
            other => panic!("expected single combo, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_plain_character() {
        let combo = single("a", None);
        assert_eq!(combo.key, Key::Char('a'));
        assert!(combo.modifiers.is_empty());
        assert_eq!(combo.action, ActionKind::KeyPress);
    }

    #[test]
    fn test_parse_special_key_defaults_keydown() {
        let combo = single("enter", None);
        assert_eq!(combo.key, Key::Named(NamedKey::Enter));
        assert_eq!(combo.action, ActionKind::KeyDown);
    }

    #[test]
    fn test_parse_modifier_combo_forces_keydown() {
        let combo = single("ctrl+s", None);
        assert_eq!(combo.key, Key::Char('s'));
        assert_eq!(combo.modifiers, ModifierSet::only(Modifier::Ctrl));
        assert_eq!(combo.action, ActionKind::KeyDown);
    }

    #[test]
    fn test_parse_aliases() {
        let combo = single("command+shift+o", None);
        assert_eq!(combo.key, Key::Char('o'));
        assert!(combo.modifiers.has(Modifier::Meta));
        assert!(combo.modifiers.has(Modifier::Shift));

        assert_eq!(single("option+x", None).modifiers, ModifierSet::only(Modifier::Alt));
        assert_eq!(single("return", None).key, Key::Named(NamedKey::Enter));
        assert_eq!(single("escape", None).key, Key::Named(NamedKey::Esc));
    }

    #[test]
    fn test_parse_mod_alias_is_platform_dependent() {
        let mac = match parse_combo("mod+s", None, Platform::Mac).unwrap() {
            ParsedCombo::Single(c) => c,
            _ => unreachable!(),
        };
        assert_eq!(mac.modifiers, ModifierSet::only(Modifier::Meta));

        let other = single("mod+s", None);
        assert_eq!(other.modifiers, ModifierSet::only(Modifier::Ctrl));
    }

    #[test]
    fn test_parse_shifted_character_keeps_keypress_identity() {
        // no explicit action: '*' stays the shifted character on keypress
        let combo = single("*", None);
        assert_eq!(combo.key, Key::Char('*'));
        assert!(combo.modifiers.is_empty());
        assert_eq!(combo.action, ActionKind::KeyPress);
    }

    #[test]
    fn test_parse_shifted_character_rewritten_for_keydown() {
        let combo = single("*", Some(ActionKind::KeyDown));
        assert_eq!(combo.key, Key::Char('8'));
        assert_eq!(combo.modifiers, ModifierSet::only(Modifier::Shift));
        assert_eq!(combo.action, ActionKind::KeyDown);
    }

    #[test]
    fn test_parse_literal_plus() {
        assert_eq!(single("+", None).key, Key::Char('+'));
        assert_eq!(single("++", None).key, Key::Char('+'));
        assert_eq!(single("plus", None).key, Key::Char('+'));
    }

    #[test]
    fn test_parse_modifier_alone_keyup() {
        let combo = single("meta", Some(ActionKind::KeyUp));
        assert_eq!(combo.key, Key::Named(NamedKey::Meta));
        assert_eq!(combo.modifiers, ModifierSet::only(Modifier::Meta));
        assert_eq!(combo.action, ActionKind::KeyUp);
    }

    #[test]
    fn test_parse_sequence() {
        let parsed = parse_combo("c a t", None, Platform::Other).unwrap();
        match parsed {
            ParsedCombo::Sequence(steps) => {
                assert_eq!(steps.len(), 3);
                assert_eq!(steps[0].key, Key::Char('c'));
                assert_eq!(steps[2].key, Key::Char('t'));
                assert!(steps.iter().all(|s| s.action == ActionKind::KeyPress));
            }
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_sequence_collapses_whitespace() {
        let parsed = parse_combo("  g   i ", None, Platform::Other).unwrap();
        assert!(matches!(parsed, ParsedCombo::Sequence(ref s) if s.len() == 2));
    }

    #[test]
    fn test_parse_unknown_token_falls_back() {
        let combo = single("bogus", None);
        assert_eq!(combo.key, Key::Char('B'));
        assert_eq!(combo.action, ActionKind::KeyPress);
    }

    #[test]
    fn test_parse_empty_is_an_error() {
        assert_eq!(
            parse_combo("", None, Platform::Other),
            Err(ComboParseError::Empty)
        );
        assert_eq!(
            parse_combo("   ", None, Platform::Other),
            Err(ComboParseError::Empty)
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a  b\tc"), "a b c");
        assert_eq!(collapse_whitespace(" ctrl+s "), "ctrl+s");
    }
}
