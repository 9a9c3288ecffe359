//! In-memory document
//!
//! Nodes live in an arena and are referenced by [`NodeId`]. Detached nodes
//! stay in the arena; only the parent/child links change.

use std::collections::BTreeMap;
use std::fmt::Write;

/// Compact node identifier (index into the arena)
pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Mount point handed to a renderer
    Container,
    Element,
    Text,
}

#[derive(Debug, Clone)]
pub struct DomNode {
    pub kind: NodeKind,
    /// Tag name for elements, content for text nodes
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub parent: Option<NodeId>,
    pub child_nodes: Vec<NodeId>,
}

impl DomNode {
    fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            attributes: BTreeMap::new(),
            parent: None,
            child_nodes: Vec::new(),
        }
    }

    /// Element and text nodes are visual; containers are not
    pub fn is_visual(&self) -> bool {
        matches!(self.kind, NodeKind::Element | NodeKind::Text)
    }
}

#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<DomNode>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: DomNode) -> NodeId {
        self.nodes.push(node);
        (self.nodes.len() - 1) as NodeId
    }

    pub fn create_container(&mut self) -> NodeId {
        self.push(DomNode::new(NodeKind::Container, "#container"))
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(DomNode::new(NodeKind::Element, tag))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(DomNode::new(NodeKind::Text, text))
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(id as usize) {
            node.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(child as usize) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent as usize) {
            node.child_nodes.push(child);
        }
    }

    /// Detach every child of `parent`
    pub fn clear_children(&mut self, parent: NodeId) {
        let children = match self.nodes.get_mut(parent as usize) {
            Some(node) => std::mem::take(&mut node.child_nodes),
            None => return,
        };
        for child in children {
            if let Some(node) = self.nodes.get_mut(child as usize) {
                node.parent = None;
            }
        }
    }

    pub fn child_nodes(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.child_nodes.as_slice()).unwrap_or(&[])
    }

    pub fn is_visual(&self, id: NodeId) -> bool {
        self.node(id).map(DomNode::is_visual).unwrap_or(false)
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match node.kind {
            NodeKind::Text => out.push_str(&node.name),
            _ => {
                for &child in &node.child_nodes {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Markup for a node; containers print only their children
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match node.kind {
            NodeKind::Text => out.push_str(&node.name),
            NodeKind::Container => {
                for &child in &node.child_nodes {
                    self.write_html(child, out);
                }
            }
            NodeKind::Element => {
                let _ = write!(out, "<{}", node.name);
                for (name, value) in &node.attributes {
                    let _ = write!(out, " {}=\"{}\"", name, value.replace('"', "&quot;"));
                }
                out.push('>');
                for &child in &node.child_nodes {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{}>", node.name);
            }
        }
    }

    /// Short label used when printing structures
    pub fn describe(&self, id: NodeId) -> String {
        match self.node(id) {
            Some(node) if node.kind == NodeKind::Text => format!("#text {:?}", node.name),
            Some(node) if node.kind == NodeKind::Element => format!("<{}>", node.name),
            Some(_) => "#container".to_string(),
            None => format!("#missing({})", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_print() {
        let mut doc = Document::new();
        let container = doc.create_container();
        let div = doc.create_element("div");
        doc.set_attribute(div, "class", "a");
        let text = doc.create_text("hi");
        doc.append_child(container, div);
        doc.append_child(div, text);

        assert_eq!(doc.to_html(container), r#"<div class="a">hi</div>"#);
        assert_eq!(doc.text_content(container), "hi");
        assert_eq!(doc.child_nodes(div), &[text]);
        assert!(doc.is_visual(div) && doc.is_visual(text));
        assert!(!doc.is_visual(container));
        assert_eq!(doc.describe(text), "#text \"hi\"");
    }

    #[test]
    fn test_clear_children_detaches() {
        let mut doc = Document::new();
        let container = doc.create_container();
        let div = doc.create_element("div");
        doc.append_child(container, div);
        doc.clear_children(container);
        assert!(doc.child_nodes(container).is_empty());
        assert_eq!(doc.node(div).and_then(|n| n.parent), None);
        assert_eq!(doc.len(), 2);
    }
}
