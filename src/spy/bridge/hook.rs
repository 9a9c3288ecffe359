//! Devtools hook
//!
//! The meeting point between renderers and inspectors. Renderers inject
//! themselves and report committed roots; inspectors listen for renderers and
//! ask for the roots of one renderer id.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

use crate::spy::host::{FiberRoot, RendererHandle};

pub type RendererId = u32;

/// Payload of the "renderer registered" event
#[derive(Clone)]
pub struct RendererRegistered {
    pub id: RendererId,
    pub renderer: RendererHandle,
}

type RendererListener = Rc<dyn Fn(&RendererRegistered)>;

#[derive(Default)]
struct HookState {
    next_id: Cell<RendererId>,
    renderers: RefCell<Vec<RendererRegistered>>,
    listeners: RefCell<Vec<RendererListener>>,
    roots: RefCell<BTreeMap<RendererId, Vec<FiberRoot>>>,
}

#[derive(Clone, Default)]
pub struct DevtoolsHook(Rc<HookState>);

impl DevtoolsHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer; ids start at 1
    pub fn inject(&self, renderer: RendererHandle) -> RendererId {
        let id = self.0.next_id.get() + 1;
        self.0.next_id.set(id);
        let event = RendererRegistered { id, renderer };
        self.0.renderers.borrow_mut().push(event.clone());
        debug!(renderer = id, "renderer injected");

        let listeners: Vec<RendererListener> = self.0.listeners.borrow().clone();
        for listener in listeners {
            listener(&event);
        }
        id
    }

    /// Listen for renderers; already injected ones are replayed in order
    pub fn on_renderer(&self, listener: impl Fn(&RendererRegistered) + 'static) {
        let listener: RendererListener = Rc::new(listener);
        self.0.listeners.borrow_mut().push(listener.clone());
        let existing: Vec<RendererRegistered> = self.0.renderers.borrow().clone();
        for event in &existing {
            listener(event);
        }
    }

    /// Record a commit of `root` by renderer `id`
    pub fn on_commit_root(&self, id: RendererId, root: &FiberRoot) {
        let mut roots = self.0.roots.borrow_mut();
        let entry = roots.entry(id).or_default();
        if !entry.iter().any(|r| r.ptr_eq(root)) {
            entry.push(root.clone());
        }
    }

    /// Roots committed by renderer `id`, in first-commit order
    pub fn fiber_roots(&self, id: RendererId) -> Vec<FiberRoot> {
        self.0.roots.borrow().get(&id).cloned().unwrap_or_default()
    }

    pub fn renderer_count(&self) -> usize {
        self.0.renderers.borrow().len()
    }
}
