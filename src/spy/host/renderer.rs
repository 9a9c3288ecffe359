//! Host renderer
//!
//! Mounts element values into a [`Document`] and builds the fiber graph for
//! them. The rules follow the usual host behaviour:
//!
//! - a host element whose `children` is a single string or number gets its
//!   text content set directly (a text node but no fiber)
//! - arrays give one fiber per rendered item, nested arrays a fragment
//! - `null`, `undefined`, booleans and empty strings render nothing
//! - function components are called with their props

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

use crate::spy::bridge::hook::{DevtoolsHook, RendererId};
use crate::spy::runtime::{call_value, ElementType, EvalError, Value};

use super::document::{Document, NodeId};
use super::fiber::{FiberId, FiberKind, FiberNode, FiberTree, StateNode};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("objects are not valid as a child (found {found})")]
    InvalidChild { found: String },
}

pub type RenderResult<T> = Result<T, RenderError>;

type RefreshHandler = Rc<dyn Fn()>;

/// The part of a renderer inspectors get to see
#[derive(Clone, Default)]
pub struct RendererHandle(Rc<RefCell<Option<RefreshHandler>>>);

impl RendererHandle {
    /// Called after every commit; replaces any previous handler
    pub fn set_refresh_handler(&self, handler: impl Fn() + 'static) {
        *self.0.borrow_mut() = Some(Rc::new(handler));
    }

    pub fn has_refresh_handler(&self) -> bool {
        self.0.borrow().is_some()
    }

    fn refresh(&self) {
        let handler = self.0.borrow().clone();
        if let Some(handler) = handler {
            handler();
        }
    }
}

struct RootState {
    container: NodeId,
    document: Rc<RefCell<Document>>,
    current: RefCell<Option<Rc<FiberTree>>>,
}

/// A mounted container and the fiber tree last committed into it
#[derive(Clone)]
pub struct FiberRoot(Rc<RootState>);

impl FiberRoot {
    pub fn container(&self) -> NodeId {
        self.0.container
    }

    pub fn document(&self) -> Rc<RefCell<Document>> {
        self.0.document.clone()
    }

    /// The committed tree, `None` before the first render
    pub fn current(&self) -> Option<Rc<FiberTree>> {
        self.0.current.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &FiberRoot) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

pub struct Renderer {
    id: RendererId,
    hook: DevtoolsHook,
    handle: RendererHandle,
    document: Rc<RefCell<Document>>,
}

impl Renderer {
    /// Create a renderer with its own document and inject it into `hook`
    pub fn new(hook: &DevtoolsHook) -> Self {
        let handle = RendererHandle::default();
        let id = hook.inject(handle.clone());
        Self {
            id,
            hook: hook.clone(),
            handle,
            document: Rc::new(RefCell::new(Document::new())),
        }
    }

    pub fn id(&self) -> RendererId {
        self.id
    }

    pub fn document(&self) -> Rc<RefCell<Document>> {
        self.document.clone()
    }

    pub fn create_container(&self) -> FiberRoot {
        let container = self.document.borrow_mut().create_container();
        FiberRoot(Rc::new(RootState {
            container,
            document: self.document.clone(),
            current: RefCell::new(None),
        }))
    }

    /// Render `element` into `root`, replacing whatever was there
    ///
    /// On success the new tree is committed, reported to the hook and the
    /// refresh handler runs. On failure the previous tree stays current.
    pub fn render(&self, element: &Value, root: &FiberRoot) -> RenderResult<()> {
        let tree = {
            let mut document = self.document.borrow_mut();
            document.clear_children(root.container());
            let mut mount = Mount {
                tree: FiberTree::new(),
                document: &mut *document,
            };
            let props = Value::object([("children".to_string(), element.clone())].into());
            let host_root = mount
                .tree
                .push(FiberNode::new(FiberKind::HostRoot, StateNode::Virtual, props));
            let children = mount.mount_value(element, root.container())?;
            mount.tree.link_children(host_root, &children);
            mount.tree
        };

        debug!(renderer = self.id, fibers = tree.len(), "commit");
        *root.0.current.borrow_mut() = Some(Rc::new(tree));
        self.hook.on_commit_root(self.id, root);
        self.handle.refresh();
        Ok(())
    }
}

struct Mount<'a> {
    tree: FiberTree,
    document: &'a mut Document,
}

fn is_text(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::Number(_))
}

impl Mount<'_> {
    fn mount_value(&mut self, value: &Value, dom_parent: NodeId) -> RenderResult<Vec<FiberId>> {
        match value {
            Value::Undefined | Value::Null | Value::Bool(_) => Ok(Vec::new()),
            Value::Str(s) if s.is_empty() => Ok(Vec::new()),
            Value::Str(_) | Value::Number(_) => {
                let text = self.document.create_text(&value.to_string());
                self.document.append_child(dom_parent, text);
                let fiber = FiberNode::new(FiberKind::HostText, StateNode::Text(text), value.clone());
                Ok(vec![self.tree.push(fiber)])
            }
            Value::Array(items) => {
                let mut fibers = Vec::new();
                for item in items.iter() {
                    if let Value::Array(_) = item {
                        let fragment = self.tree.push(FiberNode::new(
                            FiberKind::Fragment,
                            StateNode::Virtual,
                            item.clone(),
                        ));
                        let children = self.mount_value(item, dom_parent)?;
                        self.tree.link_children(fragment, &children);
                        fibers.push(fragment);
                    } else {
                        fibers.extend(self.mount_value(item, dom_parent)?);
                    }
                }
                Ok(fibers)
            }
            Value::Element(element) => {
                let props = Value::Object(element.props.clone());
                match &element.element_type {
                    ElementType::Tag(tag) => {
                        let node = self.document.create_element(tag);
                        for (name, value) in element.props.iter() {
                            if name != "children" && is_text(value) {
                                self.document.set_attribute(node, name, value.to_string());
                            }
                        }
                        self.document.append_child(dom_parent, node);

                        let mut fiber =
                            FiberNode::new(FiberKind::HostComponent, StateNode::Element(node), props)
                                .with_source(element.source.as_ref());
                        fiber.element_type = Some(element.element_type.clone());
                        let id = self.tree.push(fiber);

                        match element.children() {
                            Some(text) if is_text(text) => {
                                let content = text.to_string();
                                if !content.is_empty() {
                                    let text_node = self.document.create_text(&content);
                                    self.document.append_child(node, text_node);
                                }
                            }
                            Some(children) => {
                                let children = self.mount_value(children, node)?;
                                self.tree.link_children(id, &children);
                            }
                            None => {}
                        }
                        Ok(vec![id])
                    }
                    ElementType::Component(function) => {
                        trace!(component = %function.display_name(), "render component");
                        let mut fiber =
                            FiberNode::new(FiberKind::FunctionComponent, StateNode::Virtual, props.clone())
                                .with_source(element.source.as_ref());
                        fiber.element_type = Some(element.element_type.clone());
                        let id = self.tree.push(fiber);

                        let rendered = call_value(&Value::Function(function.clone()), vec![props])?;
                        let children = self.mount_value(&rendered, dom_parent)?;
                        self.tree.link_children(id, &children);
                        Ok(vec![id])
                    }
                }
            }
            other => Err(RenderError::InvalidChild {
                found: other.type_name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spy::testing::compile_and_load;

    fn render(source: &str, export: &str) -> (Renderer, FiberRoot) {
        let instance = compile_and_load(source, "/src/test.jsx").expect("module to load");
        let hook = DevtoolsHook::new();
        let renderer = Renderer::new(&hook);
        let root = renderer.create_container();
        let element = instance.export(export).cloned().expect("export");
        renderer.render(&element, &root).expect("render succeeds");
        (renderer, root)
    }

    #[test]
    fn test_single_text_child_sets_content() {
        let (renderer, root) = render("export const a = <div id=\"x\">hello</div>", "a");
        let tree = root.current().expect("committed tree");
        assert_eq!(tree.len(), 2);
        let div = tree.get(1).expect("div fiber");
        assert_eq!(div.kind, FiberKind::HostComponent);
        assert_eq!(div.child, None);
        assert!(div.debug_source.is_some());
        assert_eq!(
            renderer.document().borrow().to_html(root.container()),
            r#"<div id="x">hello</div>"#
        );
    }

    #[test]
    fn test_arrays_give_text_fibers() {
        let (renderer, root) =
            render("const t = \"b\"\nexport const a = <p>a{t}{null}<br/></p>", "a");
        let tree = root.current().expect("committed tree");
        let kinds: Vec<FiberKind> = tree
            .children(1)
            .into_iter()
            .filter_map(|id| tree.get(id).map(|f| f.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![FiberKind::HostText, FiberKind::HostText, FiberKind::HostComponent]
        );
        assert_eq!(
            renderer.document().borrow().to_html(root.container()),
            "<p>ab<br></br></p>"
        );
    }

    #[test]
    fn test_components_are_virtual() {
        let (_, root) = render(
            "const Inner = (props) => <i>{props.children}</i>\nexport const a = <Inner>x</Inner>",
            "a",
        );
        let tree = root.current().expect("committed tree");
        let component = tree.get(1).expect("component fiber");
        assert_eq!(component.kind, FiberKind::FunctionComponent);
        assert_eq!(component.state_node, StateNode::Virtual);
        let child = component.child.and_then(|id| tree.get(id)).expect("child fiber");
        assert_eq!(child.kind, FiberKind::HostComponent);
        assert_eq!(child.return_, Some(1));
    }

    #[test]
    fn test_nested_arrays_become_fragments() {
        let (_, root) = render("const xs = [\"a\", [\"b\", \"c\"]]\nexport const a = <ul>{xs}</ul>", "a");
        let tree = root.current().expect("committed tree");
        let kinds: Vec<FiberKind> = tree
            .children(1)
            .into_iter()
            .filter_map(|id| tree.get(id).map(|f| f.kind))
            .collect();
        assert_eq!(kinds, vec![FiberKind::HostText, FiberKind::Fragment]);
    }

    #[test]
    fn test_invalid_child_keeps_previous_tree() {
        let instance = compile_and_load(
            "export const ok = <b />\nexport const bad = <b>{{ a: 1 }}</b>",
            "/x.jsx",
        )
        .expect("module to load");
        let hook = DevtoolsHook::new();
        let renderer = Renderer::new(&hook);
        let root = renderer.create_container();
        let ok = instance.export("ok").cloned().expect("export");
        let bad = instance.export("bad").cloned().expect("export");
        renderer.render(&ok, &root).expect("renders");
        assert!(matches!(
            renderer.render(&bad, &root),
            Err(RenderError::InvalidChild { .. })
        ));
        assert_eq!(root.current().map(|t| t.len()), Some(2));
    }

    #[test]
    fn test_commit_runs_refresh_handler() {
        let hook = DevtoolsHook::new();
        let renderer = Renderer::new(&hook);
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        hook.on_renderer(move |event| {
            let counter = counter.clone();
            event
                .renderer
                .set_refresh_handler(move || *counter.borrow_mut() += 1);
        });
        let root = renderer.create_container();
        renderer.render(&Value::from("text"), &root).expect("renders");
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(hook.fiber_roots(renderer.id()).len(), 1);
    }
}
