//! Rendered value → recorded expressions
//!
//! Elements are keyed by identity, strings and numbers by value. Arrays are
//! never keys themselves: their items are inserted one by one under the
//! array's location.

use std::collections::HashMap;
use std::rc::Rc;

use crate::spy::runtime::{ExpressionLocation, SourceRecord, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PrimitiveKey {
    Str(Rc<str>),
    Number(u64),
}

impl PrimitiveKey {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(PrimitiveKey::Str(s.clone())),
            // -0 and 0 are one key, every NaN is the same key
            Value::Number(n) if *n == 0.0 => Some(PrimitiveKey::Number(0f64.to_bits())),
            Value::Number(n) if n.is_nan() => Some(PrimitiveKey::Number(f64::NAN.to_bits())),
            Value::Number(n) => Some(PrimitiveKey::Number(n.to_bits())),
            _ => None,
        }
    }
}

/// Cloned into every child traversal; never shared between siblings
#[derive(Debug, Clone, Default)]
pub struct ExpressionMap {
    by_identity: HashMap<usize, Vec<ExpressionLocation>>,
    by_value: HashMap<PrimitiveKey, Vec<ExpressionLocation>>,
}

impl ExpressionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every expression recorded against `record`
    pub fn fold(&mut self, record: &SourceRecord) {
        for expression in record.expressions() {
            self.insert(expression);
        }
    }

    pub fn insert(&mut self, expression: ExpressionLocation) {
        match &expression.value {
            Value::Array(items) => {
                for item in items.iter() {
                    self.insert(ExpressionLocation {
                        value: item.clone(),
                        location: expression.location.clone(),
                        is_expression: expression.is_expression,
                    });
                }
            }
            Value::Element(element) => {
                let key = Rc::as_ptr(element) as usize;
                self.by_identity.entry(key).or_default().push(expression);
            }
            value => {
                if let Some(key) = PrimitiveKey::of(value) {
                    self.by_value.entry(key).or_default().push(expression);
                }
            }
        }
    }

    /// Expressions that may have produced `value`, in insertion order
    pub fn get(&self, value: &Value) -> &[ExpressionLocation] {
        let found = match value {
            Value::Element(element) => self.by_identity.get(&(Rc::as_ptr(element) as usize)),
            other => PrimitiveKey::of(other).and_then(|key| self.by_value.get(&key)),
        };
        found.map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_identity.len() + self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty() && self.by_value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spy::runtime::{Element, ElementType, SourceLocation};
    use std::collections::BTreeMap;

    fn expression(value: Value, pos: i64) -> ExpressionLocation {
        ExpressionLocation {
            value,
            location: SourceLocation::new("/a.jsx", 1, pos, pos + 1),
            is_expression: true,
        }
    }

    fn element() -> Value {
        Value::element(Element::new(ElementType::Tag(Rc::from("b")), BTreeMap::new()))
    }

    #[test]
    fn test_primitives_by_value() {
        let mut map = ExpressionMap::new();
        map.insert(expression(Value::from("hello"), 1));
        map.insert(expression(Value::from("hello"), 2));
        map.insert(expression(Value::Number(-0.0), 3));

        let positions: Vec<i64> = map.get(&Value::from("hello")).iter().map(|e| e.location.pos).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(map.get(&Value::Number(0.0)).len(), 1);
        assert!(map.get(&Value::from("other")).is_empty());
    }

    #[test]
    fn test_elements_by_identity() {
        let mut map = ExpressionMap::new();
        let a = element();
        map.insert(expression(a.clone(), 1));
        assert_eq!(map.get(&a).len(), 1);
        assert!(map.get(&element()).is_empty());
    }

    #[test]
    fn test_arrays_are_spread() {
        let mut map = ExpressionMap::new();
        let a = element();
        map.insert(expression(Value::array(vec![a.clone(), Value::from("x"), Value::Null]), 4));
        assert_eq!(map.get(&a)[0].location.pos, 4);
        assert_eq!(map.get(&Value::from("x"))[0].location.pos, 4);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_clones_are_independent() {
        let mut parent = ExpressionMap::new();
        parent.insert(expression(Value::from("p"), 0));
        let mut child = parent.clone();
        child.insert(expression(Value::from("c"), 1));
        assert!(parent.get(&Value::from("c")).is_empty());
        assert_eq!(child.get(&Value::from("p")).len(), 1);
    }
}
