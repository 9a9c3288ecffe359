//! Source location records shared between generated code, the attribution
//! stack and the rendered fiber graph.

use serde::{Deserialize, Serialize, Serializer};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use super::value::Value;

pub const UNKNOWN_FILE: &str = "unknown";

/// A span of original source text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub file_name: String,
    pub pos: i64,
    pub end: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

impl SourceLocation {
    pub fn new(file_name: impl Into<String>, line_number: u32, pos: i64, end: i64) -> Self {
        Self {
            file_name: file_name.into(),
            pos,
            end,
            line_number: Some(line_number),
        }
    }

    /// Placeholder for nodes that carry no location
    pub fn unknown() -> Self {
        Self {
            file_name: UNKNOWN_FILE.to_string(),
            pos: -1,
            end: -1,
            line_number: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.pos < 0 && self.file_name == UNKNOWN_FILE
    }

    /// Read a location out of a runtime value, if it looks like one
    ///
    /// Accepts location records and plain objects with `fileName`, `pos`
    /// and `end` entries (and an optional `lineNumber`).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Source(record) => Some(record.location()),
            Value::Object(fields) => {
                let file_name = fields.get("fileName")?.as_str()?.to_string();
                let pos = fields.get("pos")?.as_number()? as i64;
                let end = fields.get("end")?.as_number()? as i64;
                let line_number = fields
                    .get("lineNumber")
                    .and_then(Value::as_number)
                    .map(|n| n as u32);
                Some(Self {
                    file_name,
                    pos,
                    end,
                    line_number,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "{}:{} [{}..{}]", self.file_name, line, self.pos, self.end),
            None => write!(f, "{} [{}..{}]", self.file_name, self.pos, self.end),
        }
    }
}

/// One recorded child: a text fragment or the value of an embedded expression
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionLocation {
    pub value: Value,
    pub location: SourceLocation,
    pub is_expression: bool,
}

/// An element location plus the children recorded against it, in evaluation order
#[derive(Debug, Clone, Serialize)]
pub struct LocationWithExpressions {
    #[serde(flatten)]
    pub location: SourceLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expressions: Option<Vec<ExpressionLocation>>,
}

/// Shared handle to a [`LocationWithExpressions`]
///
/// Equality is identity: two records are equal only if they are the same
/// record, which is what the generated code and the fiber graph share.
#[derive(Clone)]
pub struct SourceRecord(Rc<RefCell<LocationWithExpressions>>);

impl SourceRecord {
    pub fn new(location: SourceLocation) -> Self {
        SourceRecord(Rc::new(RefCell::new(LocationWithExpressions {
            location,
            expressions: None,
        })))
    }

    pub fn location(&self) -> SourceLocation {
        self.0.borrow().location.clone()
    }

    pub fn borrow(&self) -> Ref<'_, LocationWithExpressions> {
        self.0.borrow()
    }

    /// Recorded children, empty when nothing was recorded
    pub fn expressions(&self) -> Vec<ExpressionLocation> {
        self.0.borrow().expressions.clone().unwrap_or_default()
    }

    pub fn has_expressions(&self) -> bool {
        self.0
            .borrow()
            .expressions
            .as_ref()
            .map(|e| !e.is_empty())
            .unwrap_or(false)
    }

    /// Append a child, creating the list on first use
    pub fn push_expression(&self, expression: ExpressionLocation) {
        self.0
            .borrow_mut()
            .expressions
            .get_or_insert_with(Vec::new)
            .push(expression);
    }

    pub fn ptr_eq(&self, other: &SourceRecord) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SourceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for SourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceRecord").field(&*self.0.borrow()).finish()
    }
}

impl Serialize for SourceRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.borrow().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_unknown_location_shape() {
        assert_eq!(
            serde_json::to_value(SourceLocation::unknown()).expect("serializes"),
            json!({ "fileName": "unknown", "pos": -1, "end": -1 })
        );
    }

    #[test]
    fn test_expressions_are_created_lazily() {
        let record = SourceRecord::new(SourceLocation::new("/a.jsx", 1, 0, 10));
        assert_eq!(
            serde_json::to_value(&record).expect("serializes"),
            json!({ "fileName": "/a.jsx", "lineNumber": 1, "pos": 0, "end": 10 })
        );
        assert!(!record.has_expressions());

        record.push_expression(ExpressionLocation {
            value: Value::from("hi"),
            location: SourceLocation::new("/a.jsx", 1, 5, 7),
            is_expression: false,
        });
        assert_eq!(
            serde_json::to_value(&record).expect("serializes"),
            json!({
                "fileName": "/a.jsx", "lineNumber": 1, "pos": 0, "end": 10,
                "expressions": [{
                    "value": "hi",
                    "location": { "fileName": "/a.jsx", "lineNumber": 1, "pos": 5, "end": 7 },
                    "isExpression": false
                }]
            })
        );
    }

    #[test]
    fn test_records_compare_by_identity() {
        let a = SourceRecord::new(SourceLocation::unknown());
        let b = SourceRecord::new(SourceLocation::unknown());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_location_from_plain_object() {
        let mut fields = BTreeMap::new();
        fields.insert("fileName".to_string(), Value::from("x.jsx"));
        fields.insert("pos".to_string(), Value::Number(3.0));
        fields.insert("end".to_string(), Value::Number(9.0));
        let location = SourceLocation::from_value(&Value::object(fields)).expect("a location");
        assert_eq!(location.pos, 3);
        assert_eq!(location.line_number, None);
        assert_eq!(SourceLocation::from_value(&Value::from("custom value")), None);
    }
}
