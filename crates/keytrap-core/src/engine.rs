// Keytrap Engine
// The dispatcher / sequence tracker behind handle_event

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::action::ActionKind;
use crate::binding::{
    noop_callback, share_callback, BindingRecord, BindingTable, DirectMap, Response, SequenceRole,
    SharedCallback,
};
use crate::clock::{Clock, SystemClock};
use crate::event::{self, KeyEvent, NormalizedKey};
use crate::key::Key;
use crate::modifier;
use crate::parse::{self, ParsedCombo};
use crate::settings::EngineSettings;
use crate::target::{DefaultGuard, Element, StopGuard};

/// Deferred reset after a terminal sequence step, tolerating two
/// sequences that share a terminal key.
const SEQUENCE_SETTLE: Duration = Duration::from_millis(10);

/// Overridable raw-dispatch hook.
///
/// When installed, the interceptor replaces standard dispatch for every
/// normalized event. Chain to [`Engine::dispatch`] to keep standard
/// behavior (echo-style recording).
pub trait KeyInterceptor: Send {
    fn handle_key(&mut self, engine: &Engine, key: &NormalizedKey, event: &KeyEvent);
}

#[derive(Default)]
struct DispatchState {
    table: BindingTable,
    direct: DirectMap,
    /// Current level per registered sequence string.
    levels: IndexMap<String, u32>,
    /// Shared inactivity deadline, restarted by every intermediate step.
    reset_deadline: Option<Instant>,
    /// Post-terminal settle deadline.
    settle_deadline: Option<Instant>,
    /// The phase the next sequence step is expected to arrive on; also
    /// the inside-a-sequence marker.
    next_expected: Option<ActionKind>,
    /// Suppress the release of a key that just completed a sequence.
    ignore_next_keyup: Option<Key>,
    /// Suppress the keypress shadow of a keydown that advanced a
    /// sequence.
    ignore_next_keypress: bool,
}

impl DispatchState {
    fn in_progress(&self) -> bool {
        self.levels.values().any(|&level| level > 0)
    }

    fn reset_all_sequences(&mut self) {
        for level in self.levels.values_mut() {
            *level = 0;
        }
        self.next_expected = None;
        self.reset_deadline = None;
        self.settle_deadline = None;
    }

    fn reset_sequences_except(&mut self, keep: &[String]) {
        let mut active = false;
        for (name, level) in self.levels.iter_mut() {
            if keep.iter().any(|k| k == name) {
                active = true;
                continue;
            }
            *level = 0;
        }
        if !active {
            self.next_expected = None;
        }
    }

    /// Lazy timer evaluation, run at every dispatch entry.
    fn expire_deadlines(&mut self, now: Instant) {
        let reset_due = self.reset_deadline.is_some_and(|d| now >= d);
        let settle_due = self.settle_deadline.is_some_and(|d| now >= d);
        if reset_due || settle_due {
            self.reset_all_sequences();
        }
    }
}

/// One shortcut-dispatch instance.
///
/// The handle is cheap to clone; clones share state. No internal lock is
/// held while a user callback runs, so callbacks may bind, unbind,
/// trigger or reset through a clone of the handle and observe the change
/// on the next event.
#[derive(Clone)]
pub struct Engine {
    state: Arc<Mutex<DispatchState>>,
    guard: Arc<Mutex<Box<dyn StopGuard>>>,
    interceptor: Arc<Mutex<Option<Box<dyn KeyInterceptor>>>>,
    clock: Arc<dyn Clock>,
    settings: Arc<EngineSettings>,
    root: Option<Element>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DispatchState::default())),
            guard: Arc::new(Mutex::new(Box::new(DefaultGuard))),
            interceptor: Arc::new(Mutex::new(None)),
            clock: Arc::new(SystemClock),
            settings: Arc::new(EngineSettings::default()),
            root: None,
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Scope this engine to a root element: events targeted inside the
    /// root bypass the default text-control guard.
    pub fn with_root(mut self, root: Element) -> Self {
        self.root = Some(root);
        self
    }

    /// Register a combination or sequence string with an inferred action.
    pub fn bind<F>(&self, combo: &str, callback: F)
    where
        F: FnMut(&KeyEvent, &str) -> Response + Send + 'static,
    {
        self.bind_shared(combo, None, share_callback(callback));
    }

    /// Register a combination or sequence string for an explicit phase.
    pub fn bind_action<F>(&self, combo: &str, action: ActionKind, callback: F)
    where
        F: FnMut(&KeyEvent, &str) -> Response + Send + 'static,
    {
        self.bind_shared(combo, Some(action), share_callback(callback));
    }

    /// Register several combination strings against one callback.
    pub fn bind_all<F>(&self, combos: &[&str], callback: F)
    where
        F: FnMut(&KeyEvent, &str) -> Response + Send + 'static,
    {
        let shared = share_callback(callback);
        for combo in combos {
            self.bind_shared(combo, None, shared.clone());
        }
    }

    /// Unbinding is rebinding to a no-op.
    pub fn unbind(&self, combo: &str) {
        self.bind_shared(combo, None, noop_callback());
    }

    pub fn unbind_action(&self, combo: &str, action: ActionKind) {
        self.bind_shared(combo, Some(action), noop_callback());
    }

    pub fn unbind_all(&self, combos: &[&str]) {
        for combo in combos {
            self.bind_shared(combo, None, noop_callback());
        }
    }

    fn bind_shared(&self, combo: &str, action: Option<ActionKind>, callback: SharedCallback) {
        match parse::parse_combo(combo, action, self.settings.platform) {
            Ok(ParsedCombo::Single(resolved)) => {
                let mut state = self.state.lock();
                state.table.register(BindingRecord {
                    key: resolved.key,
                    modifiers: resolved.modifiers,
                    action: resolved.action,
                    combo: parse::collapse_whitespace(combo),
                    sequence: None,
                    callback: callback.clone(),
                });
            }
            Ok(ParsedCombo::Sequence(steps)) => {
                let name = parse::collapse_whitespace(combo);
                let mut state = self.state.lock();
                state.levels.insert(name.clone(), 0);
                if !state.in_progress() {
                    // rebinding the last in-flight sequence cancels the
                    // outstanding inactivity timer
                    state.reset_deadline = None;
                }
                let last = steps.len() - 1;
                for (i, step) in steps.iter().enumerate() {
                    let role = if i == last {
                        SequenceRole::Terminal {
                            name: name.clone(),
                            level: i as u32,
                        }
                    } else {
                        SequenceRole::Step {
                            name: name.clone(),
                            level: i as u32,
                            next_action: steps[i + 1].action,
                        }
                    };
                    state.table.register(BindingRecord {
                        key: step.key,
                        modifiers: step.modifiers,
                        action: step.action,
                        combo: name.clone(),
                        sequence: Some(role),
                        callback: callback.clone(),
                    });
                }
            }
            Err(err) => {
                log::debug!("ignoring unbindable combination '{}': {}", combo, err);
            }
        }

        // the direct map keys on the literal string and the
        // caller-supplied action, resolved or not
        self.state
            .lock()
            .direct
            .insert(combo.to_string(), action, callback);
    }

    /// Invoke the callback most recently bound to the literal
    /// (combo, action) pair. Returns false when none is registered.
    pub fn trigger(&self, combo: &str) -> bool {
        self.trigger_impl(combo, None)
    }

    pub fn trigger_action(&self, combo: &str, action: ActionKind) -> bool {
        self.trigger_impl(combo, Some(action))
    }

    fn trigger_impl(&self, combo: &str, action: Option<ActionKind>) -> bool {
        let callback = self.state.lock().direct.get(combo, action);
        let Some(callback) = callback else {
            return false;
        };
        let synthetic = KeyEvent::synthetic(action.unwrap_or(ActionKind::KeyDown));
        self.invoke(&callback, &synthetic, combo);
        true
    }

    /// Clear all bindings, the direct map and all sequence state.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.table.clear();
        state.direct.clear();
        state.levels.clear();
        state.reset_deadline = None;
        state.settle_deadline = None;
        state.next_expected = None;
        state.ignore_next_keyup = None;
        state.ignore_next_keypress = false;
    }

    /// Replace the dispatch-suppression guard.
    pub fn set_stop_guard(&self, guard: Box<dyn StopGuard>) {
        *self.guard.lock() = guard;
    }

    /// Install or remove the raw-dispatch interceptor.
    pub fn set_key_interceptor(&self, interceptor: Option<Box<dyn KeyInterceptor>>) {
        *self.interceptor.lock() = interceptor;
    }

    /// Current level of a registered sequence.
    pub fn sequence_level(&self, sequence: &str) -> Option<u32> {
        self.state
            .lock()
            .levels
            .get(&parse::collapse_whitespace(sequence))
            .copied()
    }

    /// Raw entry point: normalize, filter suppressed releases, then hand
    /// off to the interceptor or standard dispatch.
    pub fn handle_event(&self, event: &KeyEvent) {
        let Some(normalized) = event::normalize(event) else {
            return;
        };

        {
            let mut state = self.state.lock();
            if normalized.phase == ActionKind::KeyUp
                && state.ignore_next_keyup == Some(normalized.key)
            {
                state.ignore_next_keyup = None;
                return;
            }
        }

        let taken = self.interceptor.lock().take();
        if let Some(mut interceptor) = taken {
            interceptor.handle_key(self, &normalized, event);
            let mut slot = self.interceptor.lock();
            if slot.is_none() {
                *slot = Some(interceptor);
            }
            return;
        }

        self.dispatch(&normalized, event);
    }

    /// Standard dispatch for one normalized event.
    pub fn dispatch(&self, key: &NormalizedKey, event: &KeyEvent) {
        let now = self.clock.now();

        let matches = {
            let mut state = self.state.lock();
            state.expire_deadlines(now);
            state
                .table
                .lookup(key.key, key.modifiers, key.phase, &state.levels)
        };

        // only the longest in-flight sequences may act on this event, so
        // a shorter sequence sharing a suffix cannot fire alongside
        let max_level = matches
            .iter()
            .filter_map(|r| r.sequence.as_ref().map(|s| s.level()))
            .max();

        let mut processed_sequence = false;
        let mut advanced: SmallVec<[String; 2]> = SmallVec::new();

        for record in &matches {
            match &record.sequence {
                Some(role) => {
                    if Some(role.level()) != max_level {
                        continue;
                    }
                    // a guard veto skips the step but still counts as
                    // sequence handling, so plain bindings stay quiet
                    processed_sequence = true;
                    advanced.push(role.name().to_string());
                    if self.stopped(event, &record.combo) {
                        continue;
                    }
                    match role {
                        SequenceRole::Step {
                            name, next_action, ..
                        } => {
                            let mut state = self.state.lock();
                            *state.levels.entry(name.clone()).or_insert(0) += 1;
                            state.next_expected = Some(*next_action);
                            state.reset_deadline = Some(now + self.settings.sequence_timeout);
                        }
                        SequenceRole::Terminal { .. } => {
                            self.invoke(&record.callback, event, &record.combo);
                            let mut state = self.state.lock();
                            if record.action != ActionKind::KeyUp {
                                state.ignore_next_keyup = Some(record.key);
                            }
                            state.settle_deadline = Some(now + SEQUENCE_SETTLE);
                        }
                    }
                }
                None => {
                    if processed_sequence {
                        continue;
                    }
                    // exactly one plain record may fire: the first in
                    // table order; a guard veto suppresses dispatch
                    if !self.stopped(event, &record.combo) {
                        self.invoke(&record.callback, event, &record.combo);
                    }
                    break;
                }
            }
        }

        let mut state = self.state.lock();
        let ignore_this_keypress =
            key.phase == ActionKind::KeyPress && state.ignore_next_keypress;
        if state.next_expected == Some(key.phase)
            && !modifier::is_modifier_key(key.key)
            && !ignore_this_keypress
        {
            state.reset_sequences_except(&advanced);
        }
        state.ignore_next_keypress = processed_sequence && key.phase == ActionKind::KeyDown;
    }

    fn stopped(&self, event: &KeyEvent, combo: &str) -> bool {
        let mut guard = self.guard.lock();
        guard.stop_callback(event, event.target(), combo, self.root.as_ref())
    }

    fn invoke(&self, callback: &SharedCallback, event: &KeyEvent, combo: &str) {
        let mut callback = callback.lock();
        if (*callback)(event, combo) == Response::Suppress {
            event.prevent_default();
            event.stop_propagation();
        }
    }
}
