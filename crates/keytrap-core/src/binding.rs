// Keytrap Binding Table
// The append/override store behind the dispatcher, plus the direct map
// used by programmatic trigger

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::action::ActionKind;
use crate::event::KeyEvent;
use crate::key::Key;
use crate::modifier::{Modifier, ModifierSet};

/// What a callback tells the engine about the source event.
///
/// `Suppress` marks the event default-prevented and propagation-stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Propagate,
    Suppress,
}

/// Signature of a binding callback: the source event and the combination
/// string the callback was bound to.
pub type CallbackFn = dyn FnMut(&KeyEvent, &str) -> Response + Send;

/// Callbacks are shared handles so one function can back several combos
/// and so dispatch can snapshot record lists before invoking user code.
pub(crate) type SharedCallback = Arc<Mutex<Box<CallbackFn>>>;

pub(crate) fn share_callback<F>(callback: F) -> SharedCallback
where
    F: FnMut(&KeyEvent, &str) -> Response + Send + 'static,
{
    Arc::new(Mutex::new(Box::new(callback)))
}

pub(crate) fn noop_callback() -> SharedCallback {
    share_callback(|_, _| Response::Propagate)
}

/// A record's place in a key sequence.
#[derive(Debug, Clone)]
pub(crate) enum SequenceRole {
    /// Intermediate step: advancing it arms the inactivity reset and
    /// records the phase the next step will arrive on.
    Step {
        name: String,
        level: u32,
        next_action: ActionKind,
    },
    /// Final step: matching it fires the user callback.
    Terminal { name: String, level: u32 },
}

impl SequenceRole {
    pub fn name(&self) -> &str {
        match self {
            SequenceRole::Step { name, .. } | SequenceRole::Terminal { name, .. } => name,
        }
    }

    pub fn level(&self) -> u32 {
        match self {
            SequenceRole::Step { level, .. } | SequenceRole::Terminal { level, .. } => *level,
        }
    }
}

/// One registered binding. Owned exclusively by the table; replaced on
/// rebind of an equivalent combo or sequence step.
#[derive(Clone)]
pub(crate) struct BindingRecord {
    pub key: Key,
    pub modifiers: ModifierSet,
    pub action: ActionKind,
    /// The whitespace-collapsed source string the user bound.
    pub combo: String,
    pub sequence: Option<SequenceRole>,
    pub callback: SharedCallback,
}

/// Key -> ordered record list. Sequence records sit at the front of each
/// list so in-flight continuations out-rank plain bindings on the key.
#[derive(Default)]
pub(crate) struct BindingTable {
    records: IndexMap<Key, Vec<BindingRecord>>,
}

impl BindingTable {
    /// Insert a record, replacing any equivalent one first.
    pub fn register(&mut self, record: BindingRecord) {
        let list = self.records.entry(record.key).or_default();
        match &record.sequence {
            None => list.retain(|existing| {
                !(existing.sequence.is_none()
                    && existing.modifiers == record.modifiers
                    && existing.action == record.action)
            }),
            Some(role) => {
                let (name, level) = (role.name().to_string(), role.level());
                list.retain(|existing| {
                    !matches!(&existing.sequence, Some(r) if r.name() == name && r.level() == level)
                });
            }
        }

        if record.sequence.is_some() {
            list.insert(0, record);
        } else {
            list.push(record);
        }
    }

    /// All records matching a normalized event, in table order.
    ///
    /// A keypress with neither ctrl nor meta held matches on identifier
    /// alone; otherwise the modifier sets must be exactly equal. A keyup
    /// of a modifier key pressed on its own queries for that modifier.
    /// Sequence records additionally require the owning sequence to sit
    /// at their level.
    pub fn lookup(
        &self,
        key: Key,
        modifiers: ModifierSet,
        action: ActionKind,
        levels: &IndexMap<String, u32>,
    ) -> SmallVec<[BindingRecord; 4]> {
        let mut matches = SmallVec::new();
        let Some(list) = self.records.get(&key) else {
            return matches;
        };

        let modifiers = match (action, Modifier::from_key(key)) {
            (ActionKind::KeyUp, Some(released)) => ModifierSet::only(released),
            _ => modifiers,
        };

        let keypress_by_character = action == ActionKind::KeyPress
            && !modifiers.intersects(ModifierSet::CTRL | ModifierSet::META);

        for record in list {
            if let Some(role) = &record.sequence {
                let current = levels.get(role.name()).copied().unwrap_or(0);
                if current != role.level() {
                    continue;
                }
            }
            if record.action != action {
                continue;
            }
            if keypress_by_character || record.modifiers == modifiers {
                matches.push(record.clone());
            }
        }

        matches
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Literal (combo string, caller-supplied action) -> current callback.
/// Always reflects the most recent bind for that exact pair.
#[derive(Default)]
pub(crate) struct DirectMap {
    map: IndexMap<(String, Option<ActionKind>), SharedCallback>,
}

impl DirectMap {
    pub fn insert(&mut self, combo: String, action: Option<ActionKind>, callback: SharedCallback) {
        self.map.insert((combo, action), callback);
    }

    pub fn get(&self, combo: &str, action: Option<ActionKind>) -> Option<SharedCallback> {
        self.map.get(&(combo.to_string(), action)).cloned()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
