//! Fiber graph
//!
//! One fiber per component invocation or visual node, linked first-child /
//! next-sibling with a parent back link. Whether a fiber is backed by a
//! visual node is decided once, when it is created.

use crate::spy::runtime::{ElementType, SourceLocation, SourceRecord, Value};

use super::document::NodeId;

pub type FiberId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberKind {
    HostRoot,
    HostComponent,
    HostText,
    FunctionComponent,
    Fragment,
}

/// What backs a fiber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateNode {
    Element(NodeId),
    Text(NodeId),
    Virtual,
}

impl StateNode {
    pub fn visual(&self) -> Option<NodeId> {
        match self {
            StateNode::Element(id) | StateNode::Text(id) => Some(*id),
            StateNode::Virtual => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FiberNode {
    pub kind: FiberKind,
    /// `None` for roots, text and fragments
    pub element_type: Option<ElementType>,
    pub state_node: StateNode,
    pub pending_props: Value,
    pub debug_source: Option<SourceRecord>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    pub return_: Option<FiberId>,
}

impl FiberNode {
    pub fn new(kind: FiberKind, state_node: StateNode, pending_props: Value) -> Self {
        Self {
            kind,
            element_type: None,
            state_node,
            pending_props,
            debug_source: None,
            child: None,
            sibling: None,
            return_: None,
        }
    }

    /// Attach the element's `__source` value
    ///
    /// Location records are shared as is; plain location objects are copied
    /// into a fresh record. Anything else carries no location.
    pub fn with_source(mut self, source: Option<&Value>) -> Self {
        self.debug_source = match source {
            Some(Value::Source(record)) => Some(record.clone()),
            Some(other) => SourceLocation::from_value(other).map(SourceRecord::new),
            None => None,
        };
        self
    }

    pub fn is_visual(&self) -> bool {
        self.state_node.visual().is_some()
    }
}

/// Arena of fibers; the host root is always the first entry
#[derive(Debug, Clone, Default)]
pub struct FiberTree {
    nodes: Vec<FiberNode>,
}

impl FiberTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: FiberNode) -> FiberId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn get(&self, id: FiberId) -> Option<&FiberNode> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<FiberId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Make `children` the child chain of `parent`, in order
    pub fn link_children(&mut self, parent: FiberId, children: &[FiberId]) {
        for (i, &child) in children.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(child) {
                node.return_ = Some(parent);
                node.sibling = children.get(i + 1).copied();
            }
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.child = children.first().copied();
        }
    }

    /// Ids of the child chain starting at `parent.child`
    pub fn children(&self, parent: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut next = self.get(parent).and_then(|n| n.child);
        while let Some(id) = next {
            out.push(id);
            next = self.get(id).and_then(|n| n.sibling);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_children() {
        let mut tree = FiberTree::new();
        let root = tree.push(FiberNode::new(FiberKind::HostRoot, StateNode::Virtual, Value::Null));
        let a = tree.push(FiberNode::new(FiberKind::HostText, StateNode::Text(1), Value::from("a")));
        let b = tree.push(FiberNode::new(FiberKind::HostText, StateNode::Text(2), Value::from("b")));
        tree.link_children(root, &[a, b]);

        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.children(root), vec![a, b]);
        assert_eq!(tree.get(b).and_then(|n| n.return_), Some(root));
        assert_eq!(tree.get(b).and_then(|n| n.sibling), None);
        assert!(tree.get(a).map(FiberNode::is_visual).unwrap_or(false));
        assert!(!tree.get(root).map(FiberNode::is_visual).unwrap_or(true));
    }

    #[test]
    fn test_source_values() {
        let record = SourceRecord::new(SourceLocation::new("/a.jsx", 1, 0, 5));
        let fiber = FiberNode::new(FiberKind::HostComponent, StateNode::Element(0), Value::Null)
            .with_source(Some(&Value::Source(record.clone())));
        assert_eq!(fiber.debug_source, Some(record));

        let fiber = FiberNode::new(FiberKind::HostComponent, StateNode::Element(0), Value::Null)
            .with_source(Some(&Value::from("custom value")));
        assert!(fiber.debug_source.is_none());
    }
}
