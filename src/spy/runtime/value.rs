//! Runtime values
//!
//! Primitives compare by value; arrays, objects, elements, functions and the
//! runtime-support values compare by identity, the way strict equality does.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::eval::Function;
use super::location::SourceRecord;
use super::stack::StackHandle;

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<String, Value>>),
    Element(Rc<Element>),
    Function(Rc<Function>),
    Builtin(Builtin),
    Stack(StackHandle),
    Source(SourceRecord),
}

/// Runtime support functions bound to an attribution stack
#[derive(Clone, Debug)]
pub enum Builtin {
    RecordAsParent(StackHandle),
    RecordExpression(StackHandle),
}

/// A created (not yet rendered) element
#[derive(Debug)]
pub struct Element {
    pub element_type: ElementType,
    /// Props as written, `children` included; `__self` and `__source` are lifted out
    pub props: Rc<BTreeMap<String, Value>>,
    pub owner: Option<Value>,
    pub source: Option<Value>,
}

impl Element {
    pub fn new(element_type: ElementType, props: BTreeMap<String, Value>) -> Self {
        Self {
            element_type,
            props: Rc::new(props),
            owner: None,
            source: None,
        }
    }

    pub fn children(&self) -> Option<&Value> {
        self.props.get("children")
    }

    /// The source record, when the `__source` value is one
    pub fn source_record(&self) -> Option<SourceRecord> {
        match &self.source {
            Some(Value::Source(record)) => Some(record.clone()),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub enum ElementType {
    Tag(Rc<str>),
    Component(Rc<Function>),
}

impl ElementType {
    pub fn name(&self) -> String {
        match self {
            ElementType::Tag(tag) => tag.to_string(),
            ElementType::Component(function) => function.display_name(),
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Tag(tag) => write!(f, "Tag({})", tag),
            ElementType::Component(function) => write!(f, "Component({})", function.display_name()),
        }
    }
}

impl PartialEq for ElementType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ElementType::Tag(a), ElementType::Tag(b)) => a == b,
            (ElementType::Component(a), ElementType::Component(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    pub fn object(fields: BTreeMap<String, Value>) -> Self {
        Value::Object(Rc::new(fields))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    pub fn element(element: Element) -> Self {
        Value::Element(Rc::new(element))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Element(_) => "element",
            Value::Function(_) | Value::Builtin(_) => "function",
            Value::Stack(_) => "stack",
            Value::Source(_) => "location",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// `===`
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Element(a), Value::Element(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Stack(a), Value::Stack(b)) => a.ptr_eq(b),
            (Value::Source(a), Value::Source(b)) => a.ptr_eq(b),
            (Value::Builtin(a), Value::Builtin(b)) => match (a, b) {
                (Builtin::RecordAsParent(x), Builtin::RecordAsParent(y))
                | (Builtin::RecordExpression(x), Builtin::RecordExpression(y)) => x.ptr_eq(y),
                _ => false,
            },
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Rc<Element>> {
        match self {
            Value::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Property read; `None` when reading from `undefined` or `null`
    pub fn get(&self, property: &str) -> Option<Value> {
        let value = match self {
            Value::Undefined | Value::Null => return None,
            Value::Object(fields) => fields.get(property).cloned(),
            Value::Array(items) if property == "length" => Some(Value::Number(items.len() as f64)),
            Value::Array(items) => property
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned()),
            Value::Str(s) if property == "length" => Some(Value::Number(s.chars().count() as f64)),
            Value::Element(element) => match property {
                "props" => Some(Value::Object(element.props.clone())),
                "type" => Some(match &element.element_type {
                    ElementType::Tag(tag) => Value::Str(tag.clone()),
                    ElementType::Component(function) => Value::Function(function.clone()),
                }),
                "_self" => element.owner.clone(),
                "_source" => element.source.clone(),
                _ => None,
            },
            Value::Source(record) => {
                let location = record.location();
                match property {
                    "fileName" => Some(Value::from(location.file_name.as_str())),
                    "pos" => Some(Value::Number(location.pos as f64)),
                    "end" => Some(Value::Number(location.end as f64)),
                    "lineNumber" => location.line_number.map(|l| Value::Number(l as f64)),
                    _ => None,
                }
            }
            _ => None,
        };
        Some(value.unwrap_or(Value::Undefined))
    }

    /// Convert parsed JSON (e.g. props given on the command line)
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(items) => {
                Value::array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s.as_str()))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(fields) => f.debug_map().entries(fields.iter()).finish(),
            Value::Element(element) => write!(f, "<{}>", element.element_type.name()),
            Value::Function(function) => write!(f, "[Function {}]", function.display_name()),
            Value::Builtin(builtin) => write!(f, "[Builtin {:?}]", builtin),
            Value::Stack(stack) => write!(f, "[Stack depth={}]", stack.depth()),
            Value::Source(record) => write!(f, "{:?}", record),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            other => write!(f, "{:?}", other),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Element(element) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", &element.element_type.name())?;
                map.serialize_entry("props", &*element.props)?;
                map.end()
            }
            Value::Source(record) => record.serialize(serializer),
            other => serializer.collect_str(&format_args!("{:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::array(Vec::new()).is_truthy());
    }

    #[test]
    fn test_strict_equality() {
        assert_eq!(Value::from("hello"), Value::from("hello"));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        let items = Value::array(vec![Value::Null]);
        assert_eq!(items, items.clone());
        assert_ne!(items, Value::array(vec![Value::Null]));
        assert_ne!(Value::Null, Value::Undefined);
    }

    #[test]
    fn test_property_reads() {
        let mut fields = BTreeMap::new();
        fields.insert("t".to_string(), Value::from("title"));
        let props = Value::object(fields);
        assert_eq!(props.get("t"), Some(Value::from("title")));
        assert_eq!(props.get("missing"), Some(Value::Undefined));
        assert_eq!(Value::Null.get("t"), None);
        assert_eq!(
            Value::array(vec![Value::Null, Value::Bool(true)]).get("1"),
            Some(Value::Bool(true))
        );
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from_json(&json!({ "t": "title", "n": [1, 2.5, null] }));
        assert_eq!(
            serde_json::to_value(&value).expect("serializes"),
            json!({ "n": [1, 2.5, null], "t": "title" })
        );
    }
}
