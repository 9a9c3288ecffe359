//! The live bridge
//!
//! [`FiberSpy`] answers structure queries for the most recently registered
//! renderer and keeps a set of change listeners. Host callbacks only enqueue
//! events; the [`BridgeDriver`] handles them, yielding once before it
//! notifies so the host finishes its own bookkeeping first.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::spy::walker::{walk_node, DomFrameworkStructure, ExpressionMap};

use super::hook::{DevtoolsHook, RendererId, RendererRegistered};

pub type Listener = Rc<dyn Fn()>;

enum BridgeEvent {
    Registered(RendererRegistered),
    Refresh,
}

#[derive(Default)]
struct SpyState {
    active: Cell<Option<RendererId>>,
    listeners: RefCell<Vec<Listener>>,
}

impl SpyState {
    fn notify(&self) {
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        debug!(listeners = listeners.len(), "notifying listeners");
        for listener in listeners {
            listener();
        }
    }
}

pub struct FiberSpy {
    hook: DevtoolsHook,
    state: Rc<SpyState>,
    // The only strong sender; dropping the spy ends `BridgeDriver::run`
    _sender: Rc<UnboundedSender<BridgeEvent>>,
}

impl FiberSpy {
    /// Start listening for renderers on `hook`
    pub fn attach(hook: &DevtoolsHook) -> (FiberSpy, BridgeDriver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let sender = Rc::new(sender);
        let state = Rc::new(SpyState::default());

        let weak_sender = Rc::downgrade(&sender);
        let listener_state = state.clone();
        let listener_sender = weak_sender.clone();
        hook.on_renderer(move |event| {
            listener_state.active.set(Some(event.id));
            debug!(renderer = event.id, "renderer registered");
            if let Some(sender) = listener_sender.upgrade() {
                let _ = sender.send(BridgeEvent::Registered(event.clone()));
            }
        });

        let spy = FiberSpy {
            hook: hook.clone(),
            state: state.clone(),
            _sender: sender,
        };
        let driver = BridgeDriver {
            receiver,
            sender: weak_sender,
            state,
        };
        (spy, driver)
    }

    pub fn is_attached(&self) -> bool {
        self.state.active.get().is_some()
    }

    pub fn active_renderer(&self) -> Option<RendererId> {
        self.state.active.get()
    }

    /// Structure of one committed root of the active renderer
    ///
    /// `None` selects the last root the renderer committed for the first time. Returns `None` when no
    /// renderer is known, no root matches or the root rendered nothing.
    pub fn get_current_structure(&self, root_index: Option<usize>) -> Option<Vec<DomFrameworkStructure>> {
        let renderer = self.state.active.get()?;
        let roots = self.hook.fiber_roots(renderer);
        let root = match root_index {
            Some(index) => roots.get(index)?,
            None => roots.last()?,
        };
        let tree = root.current()?;
        let host_root = tree.root()?;
        tree.get(host_root)?.child?;

        let document = root.document();
        let document = document.borrow();
        Some(walk_node(&tree, &document, host_root, &ExpressionMap::new()))
    }

    /// Add a listener; adding the same listener twice has no effect
    pub fn subscribe(&self, listener: Listener) {
        let mut listeners = self.state.listeners.borrow_mut();
        if !listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    pub fn unsubscribe(&self, listener: &Listener) {
        self.state
            .listeners
            .borrow_mut()
            .retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }
}

/// Handles queued host events
pub struct BridgeDriver {
    receiver: UnboundedReceiver<BridgeEvent>,
    sender: Weak<UnboundedSender<BridgeEvent>>,
    state: Rc<SpyState>,
}

impl BridgeDriver {
    /// Handle everything queued so far, including events queued while
    /// handling; returns the number of events handled
    pub async fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.handle(event).await;
            handled += 1;
        }
        handled
    }

    /// Handle events until the spy is dropped
    pub async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.handle(event).await;
        }
        debug!("bridge closed");
    }

    async fn handle(&mut self, event: BridgeEvent) {
        tokio::task::yield_now().await;
        if let BridgeEvent::Registered(registered) = event {
            let sender = self.sender.clone();
            registered.renderer.set_refresh_handler(move || {
                if let Some(sender) = sender.upgrade() {
                    let _ = sender.send(BridgeEvent::Refresh);
                }
            });
            debug!(renderer = registered.id, "refresh handler installed");
        }
        self.state.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spy::host::Renderer;
    use crate::spy::runtime::Value;

    fn counter() -> (Listener, Rc<Cell<usize>>) {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        (Rc::new(move || inner.set(inner.get() + 1)), count)
    }

    #[test]
    fn test_unattached_spy_has_no_structure() {
        let hook = DevtoolsHook::new();
        let (spy, _driver) = FiberSpy::attach(&hook);
        assert!(!spy.is_attached());
        assert!(spy.get_current_structure(None).is_none());
    }

    #[tokio::test]
    async fn test_notifies_after_registration_and_refresh() {
        let hook = DevtoolsHook::new();
        let (spy, mut driver) = FiberSpy::attach(&hook);
        let (listener, count) = counter();
        spy.subscribe(listener);

        let renderer = Renderer::new(&hook);
        let root = renderer.create_container();
        assert_eq!(spy.active_renderer(), Some(renderer.id()));
        renderer.render(&Value::from("a"), &root).expect("renders");
        assert_eq!(count.get(), 0);

        assert_eq!(driver.drain().await, 1);
        assert_eq!(count.get(), 1);

        renderer.render(&Value::from("b"), &root).expect("renders");
        assert_eq!(count.get(), 1);
        driver.drain().await;
        assert_eq!(count.get(), 2);
    }

    #[tokio::test]
    async fn test_unsubscribed_listeners_are_not_called() {
        let hook = DevtoolsHook::new();
        let _renderer = Renderer::new(&hook);
        let (spy, mut driver) = FiberSpy::attach(&hook);
        let (kept, kept_count) = counter();
        let (removed, removed_count) = counter();
        spy.subscribe(kept.clone());
        spy.subscribe(kept);
        spy.subscribe(removed.clone());
        spy.unsubscribe(&removed);
        assert_eq!(spy.listener_count(), 1);

        driver.drain().await;
        assert_eq!(kept_count.get(), 1);
        assert_eq!(removed_count.get(), 0);
    }

    #[tokio::test]
    async fn test_last_registered_renderer_wins() {
        let hook = DevtoolsHook::new();
        let (spy, mut driver) = FiberSpy::attach(&hook);
        let first = Renderer::new(&hook);
        let second = Renderer::new(&hook);
        driver.drain().await;
        assert_eq!(spy.active_renderer(), Some(second.id()));

        let root = first.create_container();
        first.render(&Value::from("x"), &root).expect("renders");
        assert!(spy.get_current_structure(None).is_none());
    }

    #[tokio::test]
    async fn test_run_ends_when_spy_is_dropped() {
        let hook = DevtoolsHook::new();
        let (spy, driver) = FiberSpy::attach(&hook);
        let _renderer = Renderer::new(&hook);
        drop(spy);
        driver.run().await;
    }

    #[tokio::test]
    #[should_panic(expected = "listener failed")]
    async fn test_listener_panics_propagate() {
        let hook = DevtoolsHook::new();
        let (spy, mut driver) = FiberSpy::attach(&hook);
        spy.subscribe(Rc::new(|| panic!("listener failed")));
        let _renderer = Renderer::new(&hook);
        driver.drain().await;
    }
}
