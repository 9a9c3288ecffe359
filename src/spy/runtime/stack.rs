//! The attribution stack
//!
//! Generated code pushes an element's location record before that element's
//! children are evaluated, and every wrapped child records itself against the
//! record on top. The last wrapped child of an element pops it again.

use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

use super::location::{ExpressionLocation, SourceLocation, SourceRecord};
use super::value::Value;

#[derive(Debug, Default)]
pub struct AttributionStack {
    entries: Vec<SourceRecord>,
}

impl AttributionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `record` and hand it back unchanged
    pub fn record_as_parent(&mut self, record: SourceRecord) -> SourceRecord {
        self.entries.push(record.clone());
        record
    }

    /// Record `value` against the top entry and hand it back unchanged
    ///
    /// With nothing on the stack this is a pass-through.
    pub fn record_expression(
        &mut self,
        location: SourceLocation,
        value: Value,
        is_expression: bool,
        is_last: bool,
    ) -> Value {
        let Some(top) = self.entries.last() else {
            trace!(%location, "no parent awaiting children");
            return value;
        };
        top.push_expression(ExpressionLocation {
            value: value.clone(),
            location,
            is_expression,
        });
        if is_last {
            self.entries.pop();
        }
        value
    }

    pub fn top(&self) -> Option<&SourceRecord> {
        self.entries.last()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared handle to one [`AttributionStack`]
#[derive(Clone, Default)]
pub struct StackHandle(Rc<RefCell<AttributionStack>>);

impl StackHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_as_parent(&self, record: SourceRecord) -> SourceRecord {
        self.0.borrow_mut().record_as_parent(record)
    }

    pub fn record_expression(
        &self,
        location: SourceLocation,
        value: Value,
        is_expression: bool,
        is_last: bool,
    ) -> Value {
        self.0
            .borrow_mut()
            .record_expression(location, value, is_expression, is_last)
    }

    pub fn depth(&self) -> usize {
        self.0.borrow().depth()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn top(&self) -> Option<SourceRecord> {
        self.0.borrow().top().cloned()
    }

    pub fn ptr_eq(&self, other: &StackHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for StackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StackHandle(depth={})", self.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pos: i64) -> SourceRecord {
        SourceRecord::new(SourceLocation::new("/a.jsx", 1, pos, pos + 10))
    }

    fn at(pos: i64) -> SourceLocation {
        SourceLocation::new("/a.jsx", 1, pos, pos + 1)
    }

    #[test]
    fn test_empty_stack_passes_values_through() {
        let mut stack = AttributionStack::new();
        let value = stack.record_expression(at(0), Value::from("x"), true, true);
        assert_eq!(value, Value::from("x"));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_push_returns_same_record() {
        let mut stack = AttributionStack::new();
        let parent = record(0);
        assert_eq!(stack.record_as_parent(parent.clone()), parent);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_nested_records_attribute_to_nearest_parent() {
        let stack = StackHandle::new();
        let outer = stack.record_as_parent(record(0));
        let inner = stack.record_as_parent(record(5));

        stack.record_expression(at(6), Value::from("a"), false, false);
        stack.record_expression(at(7), Value::from("b"), true, true);
        assert_eq!(stack.top(), Some(outer.clone()));
        stack.record_expression(at(20), Value::Number(1.0), true, true);
        assert!(stack.is_empty());

        let inner_values: Vec<Value> = inner.expressions().into_iter().map(|e| e.value).collect();
        assert_eq!(inner_values, vec![Value::from("a"), Value::from("b")]);
        let outer_expressions = outer.expressions();
        assert_eq!(outer_expressions.len(), 1);
        assert!(outer_expressions[0].is_expression);
    }

    #[test]
    fn test_duplicate_values_keep_order() {
        let stack = StackHandle::new();
        let parent = stack.record_as_parent(record(0));
        stack.record_expression(at(1), Value::from("hello"), true, false);
        stack.record_expression(at(2), Value::from("hello"), true, true);
        let positions: Vec<i64> = parent.expressions().iter().map(|e| e.location.pos).collect();
        assert_eq!(positions, vec![1, 2]);
    }
}
