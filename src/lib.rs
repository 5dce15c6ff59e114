// Keytrap
// Facade over keytrap-core: re-exports plus the optional process-wide
// default engine instance

use std::sync::LazyLock;

pub use keytrap_core::{
    collapse_whitespace, is_modifier_key, key_from_code, key_from_name, normalize, parse_combo,
    unshifted, ActionKind, CallbackFn, Clock, Combo, ComboParseError, DefaultGuard, Element,
    Engine, EngineSettings, Key, KeyEvent, KeyInterceptor, ManualClock, Modifier, ModifierSet,
    NamedKey, NormalizedKey, ParsedCombo, Platform, Response, SettingsError, StopGuard,
    SystemClock, OPT_IN_CLASS,
};

static DEFAULT_ENGINE: LazyLock<Engine> = LazyLock::new(Engine::new);

/// A handle to the default engine.
///
/// The default instance is created on first use and lives for the
/// process; hosts that dispatch to several target elements construct
/// their own [`Engine`] per element instead.
pub fn engine() -> Engine {
    DEFAULT_ENGINE.clone()
}

/// Bind a combination or sequence string on the default engine.
pub fn bind<F>(combo: &str, callback: F)
where
    F: FnMut(&KeyEvent, &str) -> Response + Send + 'static,
{
    DEFAULT_ENGINE.bind(combo, callback);
}

/// Bind for an explicit phase on the default engine.
pub fn bind_action<F>(combo: &str, action: ActionKind, callback: F)
where
    F: FnMut(&KeyEvent, &str) -> Response + Send + 'static,
{
    DEFAULT_ENGINE.bind_action(combo, action, callback);
}

/// Unbind on the default engine.
pub fn unbind(combo: &str) {
    DEFAULT_ENGINE.unbind(combo);
}

pub fn unbind_action(combo: &str, action: ActionKind) {
    DEFAULT_ENGINE.unbind_action(combo, action);
}

/// Programmatically invoke a bound callback on the default engine.
pub fn trigger(combo: &str) -> bool {
    DEFAULT_ENGINE.trigger(combo)
}

pub fn trigger_action(combo: &str, action: ActionKind) -> bool {
    DEFAULT_ENGINE.trigger_action(combo, action)
}

/// Clear all bindings and sequence state on the default engine.
pub fn reset() {
    DEFAULT_ENGINE.reset();
}

/// Feed a raw key event to the default engine.
pub fn handle_event(event: &KeyEvent) {
    DEFAULT_ENGINE.handle_event(event);
}
