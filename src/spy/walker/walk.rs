//! Fiber graph → [`DomFrameworkStructure`]
//!
//! A visual fiber produces one structure: its own info first, its fiber
//! children below it, then the recorded expressions of its `children` prop
//! reconciled onto those children by position. A virtual fiber folds its
//! recorded expressions into a copy of the map, walks its child chain with
//! it and appends its own info to the first resulting entry, so layered
//! components collapse onto the nearest visual node, innermost first.
//! Siblings always see the map their parent was given.

use tracing::trace;

use crate::spy::host::fiber::{FiberId, FiberTree};
use crate::spy::host::Document;
use crate::spy::runtime::{ExpressionLocation, Value};

use super::expression_map::ExpressionMap;
use super::structure::{ComponentInfo, DomFrameworkStructure};

/// A single fiber's contribution, without its siblings
pub fn walk_node(
    tree: &FiberTree,
    document: &Document,
    id: FiberId,
    map: &ExpressionMap,
) -> Vec<DomFrameworkStructure> {
    let Some(fiber) = tree.get(id) else {
        return Vec::new();
    };

    if let Some(node) = fiber.state_node.visual() {
        let children = fiber
            .child
            .map(|child| walk_sibling_chain(tree, document, child, map))
            .unwrap_or_default();
        let mut structure = DomFrameworkStructure {
            node: Some(node),
            components: vec![ComponentInfo::of_fiber(fiber)],
            children,
        };

        let expressions = fiber
            .debug_source
            .as_ref()
            .map(|record| record.expressions())
            .unwrap_or_default();
        let children_prop = fiber.pending_props.get("children").unwrap_or(Value::Undefined);
        if children_prop.is_truthy() {
            let groups = reconcile(&children_prop, &expressions, map);
            let child_nodes = document.child_nodes(node);
            for (i, group) in groups.into_iter().enumerate() {
                if let Some(child) = structure.children.get_mut(i) {
                    child.components.extend(group);
                } else if let Some(&dom_child) = child_nodes.get(i) {
                    structure.children.push(DomFrameworkStructure::leaf(dom_child, group));
                }
            }
        }
        return vec![structure];
    }

    let Some(child) = fiber.child else {
        return vec![DomFrameworkStructure::default()];
    };

    let mut local = map.clone();
    if let Some(record) = &fiber.debug_source {
        local.fold(record);
    }
    let mut structures = walk_sibling_chain(tree, document, child, &local);
    if structures.is_empty() {
        structures.push(DomFrameworkStructure::default());
    }
    trace!(fiber = id, entries = structures.len(), "collapsed virtual fiber");
    structures[0].components.push(ComponentInfo::of_fiber(fiber));
    structures
}

/// Every fiber of the chain starting at `first`, in order
pub fn walk_sibling_chain(
    tree: &FiberTree,
    document: &Document,
    first: FiberId,
    map: &ExpressionMap,
) -> Vec<DomFrameworkStructure> {
    let mut structures = Vec::new();
    let mut next = Some(first);
    while let Some(id) = next {
        structures.extend(walk_node(tree, document, id, map));
        next = tree.get(id).and_then(|fiber| fiber.sibling);
    }
    structures
}

/// Pseudo-components per child position
///
/// Either `children` as a whole is the first recorded expression, or it is a
/// sequence whose items are matched against the recorded expressions in
/// order; an expression is consumed only by a match. Unmatched expressions at
/// the end are dropped.
pub fn reconcile(
    children: &Value,
    expressions: &[ExpressionLocation],
    map: &ExpressionMap,
) -> Vec<Vec<ComponentInfo>> {
    let Some(first) = expressions.first() else {
        return Vec::new();
    };
    if !children.is_truthy() {
        return Vec::new();
    }

    let whole = match_expression(children, first, map);
    if !whole.is_empty() {
        return vec![whole];
    }

    let Value::Array(items) = children else {
        return Vec::new();
    };
    let mut cursor = 0;
    let mut groups = Vec::with_capacity(items.len());
    for item in items.iter() {
        let mut group = Vec::new();
        if item.is_truthy() {
            if let Some(expression) = expressions.get(cursor) {
                group = match_expression(item, expression, map);
                if !group.is_empty() {
                    cursor += 1;
                }
            }
        }
        groups.push(group);
    }
    groups
}

fn match_expression(
    value: &Value,
    expression: &ExpressionLocation,
    map: &ExpressionMap,
) -> Vec<ComponentInfo> {
    if !expression.value.strict_eq(value) {
        return Vec::new();
    }
    let own = ComponentInfo::pseudo(
        expression.is_expression,
        expression.location.clone(),
        &expression.value,
    );
    if !expression.is_expression {
        return vec![own];
    }
    let mut found = lookup(map, value);
    found.push(own);
    found
}

/// Contributors the map knows for `value`; arrays are looked up item by item
fn lookup(map: &ExpressionMap, value: &Value) -> Vec<ComponentInfo> {
    if let Value::Array(items) = value {
        return items.iter().flat_map(|item| lookup(map, item)).collect();
    }
    map.get(value)
        .iter()
        .map(|found| ComponentInfo::pseudo(found.is_expression, found.location.clone(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spy::runtime::SourceLocation;
    use crate::spy::walker::structure::Component;

    fn recorded(value: Value, pos: i64, is_expression: bool) -> ExpressionLocation {
        ExpressionLocation {
            value,
            location: SourceLocation::new("/a.jsx", 1, pos, pos + 1),
            is_expression,
        }
    }

    fn summary(groups: &[Vec<ComponentInfo>]) -> Vec<Vec<(Component, i64)>> {
        groups
            .iter()
            .map(|g| g.iter().map(|c| (c.component.clone(), c.location.pos)).collect())
            .collect()
    }

    #[test]
    fn test_no_expressions() {
        assert!(reconcile(&Value::from("x"), &[], &ExpressionMap::new()).is_empty());
    }

    #[test]
    fn test_whole_children_as_one_text() {
        let groups = reconcile(
            &Value::from("hello"),
            &[recorded(Value::from("hello"), 5, false)],
            &ExpressionMap::new(),
        );
        assert_eq!(summary(&groups), vec![vec![(Component::TextNode, 5)]]);
    }

    #[test]
    fn test_duplicates_are_consumed_in_order() {
        let children = Value::array(vec![Value::from("title"), Value::from("title")]);
        let groups = reconcile(
            &children,
            &[
                recorded(Value::from("title"), 5, false),
                recorded(Value::from("title"), 10, true),
            ],
            &ExpressionMap::new(),
        );
        assert_eq!(
            summary(&groups),
            vec![
                vec![(Component::TextNode, 5)],
                vec![(Component::ExpressionNode, 10)]
            ]
        );
    }

    #[test]
    fn test_literal_children_and_falsy_items_are_skipped() {
        let literal = Value::from("static");
        let children = Value::array(vec![literal, Value::Null, Value::from("dyn")]);
        let groups = reconcile(
            &children,
            &[recorded(Value::from("dyn"), 7, true)],
            &ExpressionMap::new(),
        );
        assert_eq!(
            summary(&groups),
            vec![vec![], vec![], vec![(Component::ExpressionNode, 7)]]
        );
    }

    #[test]
    fn test_expressions_pick_up_folded_entries() {
        let mut map = ExpressionMap::new();
        map.insert(recorded(Value::from("t"), 1, true));
        let groups = reconcile(&Value::from("t"), &[recorded(Value::from("t"), 9, true)], &map);
        assert_eq!(
            summary(&groups),
            vec![vec![(Component::ExpressionNode, 1), (Component::ExpressionNode, 9)]]
        );
    }

    #[test]
    fn test_unmatched_tail_is_dropped() {
        let groups = reconcile(
            &Value::array(vec![Value::from("a"), Value::from("b")]),
            &[
                recorded(Value::from("a"), 1, true),
                recorded(Value::from("zzz"), 2, true),
            ],
            &ExpressionMap::new(),
        );
        assert_eq!(summary(&groups), vec![vec![(Component::ExpressionNode, 1)], vec![]]);
    }
}
