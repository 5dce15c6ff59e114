// Keytrap Core Library
// Key-event normalization and combination/sequence dispatch

pub mod action;
pub mod binding;
pub mod clock;
pub mod combo;
pub mod engine;
pub mod event;
pub mod key;
pub mod modifier;
pub mod parse;
pub mod settings;
pub mod target;

pub use action::ActionKind;
pub use binding::{CallbackFn, Response};
pub use clock::{Clock, ManualClock, SystemClock};
pub use combo::Combo;
pub use engine::{Engine, KeyInterceptor};
pub use event::{normalize, KeyEvent, NormalizedKey};
pub use key::{key_from_code, key_from_name, unshifted, Key, NamedKey};
pub use modifier::{is_modifier_key, Modifier, ModifierSet};
pub use parse::{collapse_whitespace, parse_combo, ComboParseError, ParsedCombo};
pub use settings::{EngineSettings, Platform, SettingsError};
pub use target::{DefaultGuard, Element, StopGuard, OPT_IN_CLASS};
