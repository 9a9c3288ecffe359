//! AST for markup modules
//!
//! Parsed nodes carry the byte range they were parsed from. Nodes introduced
//! by the instrumentation pass ([`Expr::Location`], [`Expr::Helper`] and the
//! declarations built around them) have no counterpart in the source text.

use std::ops::Range;
use std::rc::Rc;

pub type ByteRange = Range<usize>;

/// A parsed module: a flat list of top-level statements
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Statement>,
}

impl Module {
    pub fn new(body: Vec<Statement>) -> Self {
        Self { body }
    }

    /// Index of the first statement that is not an import
    pub fn first_non_import(&self) -> usize {
        self.body
            .iter()
            .position(|s| !matches!(s, Statement::Import(_)))
            .unwrap_or(self.body.len())
    }

    /// Names bound at the top level of the module
    pub fn declared_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for statement in &self.body {
            match statement {
                Statement::Import(import) => {
                    names.extend(import.bindings.iter().map(|b| b.local.as_str()))
                }
                Statement::Const(decl) => names.push(decl.name.as_str()),
                _ => {}
            }
        }
        names
    }

    pub fn exported_names(&self) -> Vec<&str> {
        self.body
            .iter()
            .filter_map(|s| match s {
                Statement::Const(decl) if decl.exported => Some(decl.name.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import(Import),
    Const(ConstDecl),
    Return(Option<Expr>),
    Expr(Expr),
}

/// `import a, { b as c } from "specifier";`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub specifier: String,
    pub bindings: Vec<ImportBinding>,
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportBinding {
    pub imported: Imported,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Imported {
    Default,
    Namespace,
    Named(String),
}

/// `export? const name = init;`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub exported: bool,
    pub name: String,
    pub init: Expr,
}

impl ConstDecl {
    pub fn new(name: impl Into<String>, init: Expr) -> Self {
        Self {
            exported: false,
            name: name.into(),
            init,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    This,
    Ident(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Arrow(Rc<ArrowFunction>),
    Object(Vec<Property>),
    Array(Vec<Expr>),
    Paren(Box<Expr>),
    Jsx(Box<JsxElement>),
    /// `{ fileName: <file>, lineNumber, pos, end }`
    Location(LocationLiteral),
    /// Runtime support declared by the instrumentation pass
    Helper(Helper),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Value(Expr),
    Shorthand,
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunction {
    pub params: Vec<Param>,
    pub body: ArrowBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Ident(String),
    /// `({ a, b })`
    Destructure(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Vec<Statement>),
}

/// Location object emitted for an element or a wrapped child
#[derive(Debug, Clone, PartialEq)]
pub struct LocationLiteral {
    /// Binding that holds the file name
    pub file: String,
    pub line_number: u32,
    pub pos: i64,
    pub end: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Helper {
    /// The per-module attribution stack
    NewStack,
    /// `(source) => { stack.unshift(source); return source; }`
    RecordAsParent { stack: String },
    /// `(location, value, isExp, lastExp) => { ... return value; }`
    RecordExpression { stack: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    pub name: String,
    pub attributes: Vec<JsxAttribute>,
    /// `None` for self-closing elements
    pub children: Option<Vec<JsxChild>>,
    pub range: ByteRange,
}

impl JsxElement {
    pub fn children(&self) -> &[JsxChild] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Lowercase and hyphenated names are host tags, the rest are components
    pub fn is_host_tag(&self) -> bool {
        is_host_tag_name(&self.name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes
            .iter()
            .any(|attr| matches!(attr, JsxAttribute::Named { name: n, .. } if n == name))
    }
}

pub fn is_host_tag_name(name: &str) -> bool {
    if name.contains('.') {
        return false;
    }
    name.contains('-')
        || name
            .chars()
            .next()
            .map(|c| c.is_ascii_lowercase())
            .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttribute {
    Named {
        name: String,
        value: Option<JsxAttrValue>,
    },
    Spread(Expr),
}

impl JsxAttribute {
    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        JsxAttribute::Named {
            name: name.into(),
            value: Some(JsxAttrValue::Expr(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttrValue {
    Str(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxChild {
    Text(JsxText),
    Expr(JsxExprContainer),
    Element(JsxElement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxText {
    pub raw: String,
    pub range: ByteRange,
}

impl JsxText {
    /// Text that survives JSX whitespace rules
    pub fn is_significant(&self) -> bool {
        !self.raw.trim().is_empty()
    }

    /// The string this text renders as
    ///
    /// Lines are split on any line break; tabs become spaces; leading spaces
    /// are dropped from every line but the first and trailing spaces from
    /// every line but the last; blank lines disappear and the rest are joined
    /// with single spaces.
    pub fn cooked(&self) -> String {
        let lines: Vec<&str> = self.raw.split('\n').map(|l| l.trim_end_matches('\r')).collect();
        let last_non_empty = lines
            .iter()
            .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'));

        let mut out = String::new();
        for (i, line) in lines.iter().enumerate() {
            let mut trimmed = line.replace('\t', " ");
            if i != 0 {
                trimmed = trimmed.trim_start_matches(' ').to_string();
            }
            if i != lines.len() - 1 {
                trimmed = trimmed.trim_end_matches(' ').to_string();
            }
            if !trimmed.is_empty() {
                out.push_str(&trimmed);
                if Some(i) != last_non_empty {
                    out.push(' ');
                }
            }
        }
        out
    }

    /// Byte range with surrounding whitespace removed
    pub fn trimmed_range(&self) -> ByteRange {
        let leading = self.raw.len() - self.raw.trim_start().len();
        let trailing = self.raw.len() - self.raw.trim_end().len();
        let start = self.range.start + leading;
        let end = (self.range.end - trailing).max(start);
        start..end
    }
}

/// `{expr}`, or `{}` / `{/* comment */}` when `expr` is `None`
#[derive(Debug, Clone, PartialEq)]
pub struct JsxExprContainer {
    pub expr: Option<Expr>,
    pub range: ByteRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_tag_names() {
        assert!(is_host_tag_name("div"));
        assert!(is_host_tag_name("my-widget"));
        assert!(!is_host_tag_name("Widget"));
        assert!(!is_host_tag_name("Ui.Button"));
    }

    fn text(raw: &str) -> JsxText {
        JsxText {
            raw: raw.to_string(),
            range: 10..10 + raw.len(),
        }
    }

    #[test]
    fn test_cooked_text() {
        assert_eq!(text("hello world").cooked(), "hello world");
        assert_eq!(text("  hi  ").cooked(), "  hi  ");
        assert_eq!(text("\n    hello\n    world\n  ").cooked(), "hello world");
        assert_eq!(text("a\r\n\r\n\tb").cooked(), "a b");
        assert_eq!(text("\n   \n").cooked(), "");
    }

    #[test]
    fn test_trimmed_range() {
        let t = text("\n  title  ");
        assert_eq!(t.trimmed_range(), 13..18);
        assert_eq!(text("   ").trimmed_range(), 13..13);
    }

    #[test]
    fn test_first_non_import() {
        let import = Statement::Import(Import {
            specifier: "react".to_string(),
            bindings: Vec::new(),
            range: 0..10,
        });
        let decl = Statement::Const(ConstDecl::new("a", Expr::Null));
        let module = Module::new(vec![import.clone(), decl.clone(), import]);
        assert_eq!(module.first_non_import(), 1);
        assert_eq!(Module::new(Vec::new()).first_non_import(), 0);
    }
}
