//! Mutable AST traversal
//!
//! Every `visit_mut_*` method defaults to the matching `walk_*` function, which
//! recurses into the node's children. Implementors override the nodes they
//! care about and call the walk function themselves to keep descending.

use super::ast::{
    ArrowBody, Expr, JsxAttrValue, JsxAttribute, JsxChild, JsxElement, Module, PropertyValue,
    Statement,
};

pub trait VisitMut {
    fn visit_mut_module(&mut self, module: &mut Module) {
        walk_module(self, module);
    }

    fn visit_mut_statement(&mut self, statement: &mut Statement) {
        walk_statement(self, statement);
    }

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }

    fn visit_mut_jsx_element(&mut self, element: &mut JsxElement) {
        walk_jsx_element(self, element);
    }
}

pub fn walk_module<V: VisitMut + ?Sized>(visitor: &mut V, module: &mut Module) {
    for statement in &mut module.body {
        visitor.visit_mut_statement(statement);
    }
}

pub fn walk_statement<V: VisitMut + ?Sized>(visitor: &mut V, statement: &mut Statement) {
    match statement {
        Statement::Import(_) | Statement::Return(None) => {}
        Statement::Const(decl) => visitor.visit_mut_expr(&mut decl.init),
        Statement::Return(Some(expr)) | Statement::Expr(expr) => visitor.visit_mut_expr(expr),
    }
}

pub fn walk_expr<V: VisitMut + ?Sized>(visitor: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Member { object, .. } => visitor.visit_mut_expr(object),
        Expr::Call { callee, args } => {
            visitor.visit_mut_expr(callee);
            for arg in args {
                visitor.visit_mut_expr(arg);
            }
        }
        Expr::Arrow(function) => {
            // Shared only with runtime values, which do not exist yet at compile time
            let function = std::rc::Rc::make_mut(function);
            match &mut function.body {
                ArrowBody::Expr(body) => visitor.visit_mut_expr(body),
                ArrowBody::Block(statements) => {
                    for statement in statements {
                        visitor.visit_mut_statement(statement);
                    }
                }
            }
        }
        Expr::Object(properties) => {
            for property in properties {
                match &mut property.value {
                    PropertyValue::Value(value) | PropertyValue::Spread(value) => {
                        visitor.visit_mut_expr(value)
                    }
                    PropertyValue::Shorthand => {}
                }
            }
        }
        Expr::Array(items) => {
            for item in items {
                visitor.visit_mut_expr(item);
            }
        }
        Expr::Paren(inner) => visitor.visit_mut_expr(inner),
        Expr::Jsx(element) => visitor.visit_mut_jsx_element(element),
        Expr::Str(_)
        | Expr::Number(_)
        | Expr::Bool(_)
        | Expr::Null
        | Expr::This
        | Expr::Ident(_)
        | Expr::Location(_)
        | Expr::Helper(_) => {}
    }
}

pub fn walk_jsx_element<V: VisitMut + ?Sized>(visitor: &mut V, element: &mut JsxElement) {
    for attribute in &mut element.attributes {
        match attribute {
            JsxAttribute::Named {
                value: Some(JsxAttrValue::Expr(expr)),
                ..
            }
            | JsxAttribute::Spread(expr) => visitor.visit_mut_expr(expr),
            JsxAttribute::Named { .. } => {}
        }
    }
    if let Some(children) = &mut element.children {
        for child in children {
            match child {
                JsxChild::Element(nested) => visitor.visit_mut_jsx_element(nested),
                JsxChild::Expr(container) => {
                    if let Some(expr) = &mut container.expr {
                        visitor.visit_mut_expr(expr);
                    }
                }
                JsxChild::Text(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spy::syntax::parser::parse_module;

    struct Renamer;

    impl VisitMut for Renamer {
        fn visit_mut_jsx_element(&mut self, element: &mut JsxElement) {
            element.name = element.name.to_uppercase();
            walk_jsx_element(self, element);
        }
    }

    #[test]
    fn test_reaches_nested_elements() {
        let mut module =
            parse_module("const a = () => <div icon={<i/>}>{[<b/>]}<p/></div>").expect("parses");
        Renamer.visit_mut_module(&mut module);

        let mut names = Vec::new();
        struct Collect<'a>(&'a mut Vec<String>);
        impl VisitMut for Collect<'_> {
            fn visit_mut_jsx_element(&mut self, element: &mut JsxElement) {
                self.0.push(element.name.clone());
                walk_jsx_element(self, element);
            }
        }
        Collect(&mut names).visit_mut_module(&mut module);
        assert_eq!(names, vec!["DIV", "I", "B", "P"]);
    }
}
