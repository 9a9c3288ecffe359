//! Reconstructed structure
//!
//! One [`DomFrameworkStructure`] per rendered visual node, carrying the
//! source-level contributors attributed to it.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::spy::host::fiber::FiberNode;
use crate::spy::host::NodeId;
use crate::spy::runtime::{ElementType, SourceLocation, Value};

pub const EXPRESSION_NODE: &str = "expression-node";
pub const TEXT_NODE: &str = "text-node";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Tag(String),
    Function(String),
    /// Roots, text and fragments have no element type
    Anonymous,
    ExpressionNode,
    TextNode,
}

impl Component {
    pub fn of(element_type: Option<&ElementType>) -> Self {
        match element_type {
            Some(ElementType::Tag(tag)) => Component::Tag(tag.to_string()),
            Some(ElementType::Component(function)) => Component::Function(function.display_name()),
            None => Component::Anonymous,
        }
    }

    pub fn pseudo(is_expression: bool) -> Self {
        if is_expression {
            Component::ExpressionNode
        } else {
            Component::TextNode
        }
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(self, Component::ExpressionNode | Component::TextNode)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Component::Tag(name) | Component::Function(name) => Some(name),
            Component::Anonymous => None,
            Component::ExpressionNode => Some(EXPRESSION_NODE),
            Component::TextNode => Some(TEXT_NODE),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Tag(tag) => write!(f, "<{}>", tag),
            Component::Anonymous => write!(f, "(anonymous)"),
            other => write!(f, "{}", other.name().unwrap_or_default()),
        }
    }
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_none(),
        }
    }
}

/// One source-level contributor to part of the visual tree
#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
    pub component: Component,
    pub location: SourceLocation,
    pub props: Value,
}

impl ComponentInfo {
    /// Info for a fiber; fibers without a source get the unknown location
    pub fn of_fiber(fiber: &FiberNode) -> Self {
        Self {
            component: Component::of(fiber.element_type.as_ref()),
            location: fiber
                .debug_source
                .as_ref()
                .map(|record| record.location())
                .unwrap_or_else(SourceLocation::unknown),
            props: fiber.pending_props.clone(),
        }
    }

    /// An `expression-node` or `text-node` for a rendered value
    pub fn pseudo(is_expression: bool, location: SourceLocation, value: &Value) -> Self {
        let mut props = BTreeMap::new();
        props.insert("value".to_string(), value.clone());
        Self {
            component: Component::pseudo(is_expression),
            location,
            props: Value::object(props),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DomFrameworkStructure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    pub components: Vec<ComponentInfo>,
    pub children: Vec<DomFrameworkStructure>,
}

impl DomFrameworkStructure {
    pub fn leaf(node: NodeId, components: Vec<ComponentInfo>) -> Self {
        Self {
            node: Some(node),
            components,
            children: Vec::new(),
        }
    }

    /// Entries with neither a node nor contributors (components that rendered nothing)
    pub fn is_placeholder(&self) -> bool {
        self.node.is_none() && self.components.is_empty() && self.children.is_empty()
    }
}
