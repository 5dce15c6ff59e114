// Keytrap Target Model
// Event-target elements and the overridable dispatch guard

use std::sync::Arc;

use crate::event::KeyEvent;

/// Class that lets a text-editing element opt back in to dispatch.
pub const OPT_IN_CLASS: &str = "keytrap";

/// Upper bound on ancestor walks. Element trees are acyclic by
/// construction, the cap only bounds pathological depth.
const MAX_ANCESTOR_DEPTH: usize = 256;

#[derive(Debug, Clone)]
struct ElementInner {
    tag: String,
    classes: Vec<String>,
    content_editable: bool,
    parent: Option<Element>,
}

/// A lightweight element handle: tag name, class list, content-editable
/// flag and a parent link. Identity is the underlying allocation, so
/// clones of one handle compare as the same node.
///
/// Builder methods produce a new node; attach parents after the parent
/// is fully built.
#[derive(Debug, Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                tag: tag.to_uppercase(),
                classes: Vec::new(),
                content_editable: false,
                parent: None,
            }),
        }
    }

    pub fn with_class(&self, class: &str) -> Self {
        let mut inner = (*self.inner).clone();
        inner.classes.push(class.to_string());
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn editable(&self) -> Self {
        let mut inner = (*self.inner).clone();
        inner.content_editable = true;
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn with_parent(&self, parent: &Element) -> Self {
        let mut inner = (*self.inner).clone();
        inner.parent = Some(parent.clone());
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Upper-cased tag name.
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.inner.classes.iter().any(|c| c == class)
    }

    pub fn is_content_editable(&self) -> bool {
        self.inner.content_editable
    }

    pub fn parent(&self) -> Option<Element> {
        self.inner.parent.clone()
    }

    /// Text-editing form controls the default guard suppresses.
    pub fn is_text_input(&self) -> bool {
        matches!(self.inner.tag.as_str(), "INPUT" | "SELECT" | "TEXTAREA")
    }

    pub fn same_node(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Iterative parent-chain walk: is this node `ancestor` or inside it?
    pub fn belongs_to(&self, ancestor: &Element) -> bool {
        let mut current = self.clone();
        for _ in 0..MAX_ANCESTOR_DEPTH {
            if current.same_node(ancestor) {
                return true;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}

/// Overridable dispatch-suppression predicate.
///
/// Returning true suppresses the binding for this event. Decorators
/// (pausing, scoping, global bindings) replace the engine's guard with
/// their own implementation, usually chaining to an inner guard.
pub trait StopGuard: Send {
    fn stop_callback(
        &mut self,
        event: &KeyEvent,
        element: Option<&Element>,
        combo: &str,
        root: Option<&Element>,
    ) -> bool;
}

/// Default guard: suppress dispatch inside text-editing controls unless
/// the element opts in or lives inside the engine's bound root.
#[derive(Debug, Default)]
pub struct DefaultGuard;

impl StopGuard for DefaultGuard {
    fn stop_callback(
        &mut self,
        _event: &KeyEvent,
        element: Option<&Element>,
        _combo: &str,
        root: Option<&Element>,
    ) -> bool {
        let Some(element) = element else {
            return false;
        };

        if element.has_class(OPT_IN_CLASS) {
            return false;
        }

        if let Some(root) = root {
            if element.belongs_to(root) {
                return false;
            }
        }

        element.is_text_input() || element.is_content_editable()
    }
}
