//! Rebuilds the source-attributed structure of a rendered fiber graph.

pub mod expression_map;
pub mod structure;
pub mod walk;

pub use expression_map::ExpressionMap;
pub use structure::{Component, ComponentInfo, DomFrameworkStructure, EXPRESSION_NODE, TEXT_NODE};
pub use walk::{reconcile, walk_node, walk_sibling_chain};
