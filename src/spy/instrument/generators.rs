//! Generated declarations and nodes
//!
//! ```text
//! const __jsxFileName = "/src/file.jsx";
//! const wcs_expression_stack = [];
//! const wcs_wrap_source = (source) => { ... };
//! const wcs_wrap_expression = (location, value, isExp, lastExp) => { ... };
//! ```

use crate::spy::syntax::ast::{
    ConstDecl, Expr, Helper, JsxAttribute, LocationLiteral, Module, Statement,
};
use crate::spy::syntax::position::LineIndex;

use super::names::GeneratedNames;
use super::options::{SELF_ATTRIBUTE, SOURCE_ATTRIBUTE};

/// Computes location literals for byte ranges of one source file
pub struct Locator<'a> {
    index: LineIndex,
    file_binding: &'a str,
    normalize_line_endings: bool,
}

impl<'a> Locator<'a> {
    pub fn new(source: &str, file_binding: &'a str, normalize_line_endings: bool) -> Self {
        Self {
            index: LineIndex::new(source),
            file_binding,
            normalize_line_endings,
        }
    }

    fn offset(&self, byte: usize) -> i64 {
        if self.normalize_line_endings {
            self.index.normalized(byte) as i64
        } else {
            byte as i64
        }
    }

    pub fn location(&self, range: &std::ops::Range<usize>) -> LocationLiteral {
        LocationLiteral {
            file: self.file_binding.to_string(),
            line_number: self.index.line_number(range.start),
            pos: self.offset(range.start),
            end: self.offset(range.end),
        }
    }
}

/// `__self={this}`
pub fn self_attribute() -> JsxAttribute {
    JsxAttribute::named(SELF_ATTRIBUTE, Expr::This)
}

/// `__source={location}` or `__source={record_as_parent(location)}`
pub fn source_attribute(
    location: LocationLiteral,
    names: &GeneratedNames,
    records_children: bool,
) -> JsxAttribute {
    let location = Expr::Location(location);
    let value = if records_children {
        Expr::call(Expr::ident(&names.record_as_parent), vec![location])
    } else {
        location
    };
    JsxAttribute::named(SOURCE_ATTRIBUTE, value)
}

/// `record_expression(location, value, isExpression, isLast)`
pub fn record_expression_call(
    names: &GeneratedNames,
    location: LocationLiteral,
    value: Expr,
    is_expression: bool,
    is_last: bool,
) -> Expr {
    Expr::call(
        Expr::ident(&names.record_expression),
        vec![
            Expr::Location(location),
            value,
            Expr::Bool(is_expression),
            Expr::Bool(is_last),
        ],
    )
}

/// Insert a statement above the first non-import statement
pub fn insert_after_imports(module: &mut Module, offset: usize, statement: Statement) {
    let at = (module.first_non_import() + offset).min(module.body.len());
    module.body.insert(at, statement);
}

pub fn add_file_name_const(module: &mut Module, names: &GeneratedNames, file_name: &str) {
    let decl = ConstDecl::new(&names.file_name, Expr::Str(file_name.to_string()));
    insert_after_imports(module, 0, Statement::Const(decl));
}

/// Declare the stack and both helpers, after the file name constant if present
pub fn add_expression_helpers(module: &mut Module, names: &GeneratedNames, after: usize) {
    let declarations = [
        ConstDecl::new(&names.stack, Expr::Helper(Helper::NewStack)),
        ConstDecl::new(
            &names.record_as_parent,
            Expr::Helper(Helper::RecordAsParent {
                stack: names.stack.clone(),
            }),
        ),
        ConstDecl::new(
            &names.record_expression,
            Expr::Helper(Helper::RecordExpression {
                stack: names.stack.clone(),
            }),
        ),
    ];
    for (i, decl) in declarations.into_iter().enumerate() {
        insert_after_imports(module, after + i, Statement::Const(decl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spy::syntax::parser::parse_module;

    fn names() -> GeneratedNames {
        GeneratedNames {
            file_name: "f".to_string(),
            stack: "s".to_string(),
            record_as_parent: "p".to_string(),
            record_expression: "e".to_string(),
        }
    }

    #[test]
    fn test_location_of_crlf_source() {
        let source = "a\r\nb\r\n<div/>";
        let locator = Locator::new(source, "f", true);
        let location = locator.location(&(6..12));
        assert_eq!(location.line_number, 3);
        assert_eq!((location.pos, location.end), (4, 10));

        let raw = Locator::new(source, "f", false).location(&(6..12));
        assert_eq!((raw.pos, raw.end), (6, 12));
    }

    #[test]
    fn test_declarations_follow_imports() {
        let mut module =
            parse_module("import a from 'a'\nimport b from 'b'\nconst x = 1").expect("parses");
        add_file_name_const(&mut module, &names(), "/src/x.jsx");
        add_expression_helpers(&mut module, &names(), 1);

        let declared: Vec<&str> = module
            .body
            .iter()
            .filter_map(|s| match s {
                Statement::Const(decl) => Some(decl.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(declared, vec!["f", "s", "p", "e", "x"]);
        assert_eq!(module.first_non_import(), 2);
    }

    #[test]
    fn test_declarations_in_module_without_imports() {
        let mut module = parse_module("const x = 1").expect("parses");
        add_file_name_const(&mut module, &names(), "x.jsx");
        match &module.body[0] {
            Statement::Const(decl) => assert_eq!(decl.init, Expr::Str("x.jsx".to_string())),
            other => panic!("expected const, got {:?}", other),
        }
    }
}
