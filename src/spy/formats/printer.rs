//! Module printer
//!
//! Renders any module, instrumented or not, back to source text. Helper
//! declarations print as the arrow functions they stand for.

use crate::spy::syntax::ast::{
    ArrowBody, ArrowFunction, Expr, Helper, Import, Imported, JsxAttrValue, JsxAttribute,
    JsxChild, JsxElement, Module, Param, PropertyValue, Statement,
};

const INDENT: &str = "  ";

pub fn print_module(module: &Module) -> String {
    let mut printer = Printer::default();
    for statement in &module.body {
        printer.statement(statement);
    }
    printer.out
}

pub fn print_expression(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl Printer {
    fn line_start(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn statement(&mut self, statement: &Statement) {
        self.line_start();
        match statement {
            Statement::Import(import) => self.import(import),
            Statement::Const(decl) => {
                if decl.exported {
                    self.out.push_str("export ");
                }
                self.out.push_str("const ");
                self.out.push_str(&decl.name);
                self.out.push_str(" = ");
                self.expr(&decl.init);
            }
            Statement::Return(None) => self.out.push_str("return"),
            Statement::Return(Some(expr)) => {
                self.out.push_str("return ");
                self.expr(expr);
            }
            Statement::Expr(expr) => self.expr(expr),
        }
        self.out.push_str(";\n");
    }

    fn import(&mut self, import: &Import) {
        self.out.push_str("import ");
        let mut parts = Vec::new();
        let mut named = Vec::new();
        for binding in &import.bindings {
            match &binding.imported {
                Imported::Default => parts.push(binding.local.clone()),
                Imported::Namespace => parts.push(format!("* as {}", binding.local)),
                Imported::Named(name) if *name == binding.local => named.push(name.clone()),
                Imported::Named(name) => named.push(format!("{} as {}", name, binding.local)),
            }
        }
        if !named.is_empty() {
            parts.push(format!("{{ {} }}", named.join(", ")));
        }
        if !parts.is_empty() {
            self.out.push_str(&parts.join(", "));
            self.out.push_str(" from ");
        }
        self.out.push_str(&quote(&import.specifier));
    }

    fn list(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(item);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Str(s) => self.out.push_str(&quote(s)),
            Expr::Number(n) => self.out.push_str(&number(*n)),
            Expr::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Expr::Null => self.out.push_str("null"),
            Expr::This => self.out.push_str("this"),
            Expr::Ident(name) => self.out.push_str(name),
            Expr::Member { object, property } => {
                self.expr(object);
                self.out.push('.');
                self.out.push_str(property);
            }
            Expr::Call { callee, args } => {
                if matches!(**callee, Expr::Arrow(_)) {
                    self.out.push('(');
                    self.expr(callee);
                    self.out.push(')');
                } else {
                    self.expr(callee);
                }
                self.out.push('(');
                self.list(args);
                self.out.push(')');
            }
            Expr::Arrow(arrow) => self.arrow(arrow),
            Expr::Object(properties) => {
                if properties.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                self.out.push_str("{ ");
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    match &property.value {
                        PropertyValue::Value(value) => {
                            self.out.push_str(&property.key);
                            self.out.push_str(": ");
                            self.expr(value);
                        }
                        PropertyValue::Shorthand => self.out.push_str(&property.key),
                        PropertyValue::Spread(value) => {
                            self.out.push_str("...");
                            self.expr(value);
                        }
                    }
                }
                self.out.push_str(" }");
            }
            Expr::Array(items) => {
                self.out.push('[');
                self.list(items);
                self.out.push(']');
            }
            Expr::Paren(inner) => {
                self.out.push('(');
                self.expr(inner);
                self.out.push(')');
            }
            Expr::Jsx(element) => self.element(element),
            Expr::Location(location) => {
                self.out.push_str(&format!(
                    "{{ fileName: {}, lineNumber: {}, pos: {}, end: {} }}",
                    location.file, location.line_number, location.pos, location.end
                ));
            }
            Expr::Helper(helper) => self.helper(helper),
        }
    }

    fn arrow(&mut self, arrow: &ArrowFunction) {
        self.out.push('(');
        for (i, param) in arrow.params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            match param {
                Param::Ident(name) => self.out.push_str(name),
                Param::Destructure(names) => {
                    self.out.push_str("{ ");
                    self.out.push_str(&names.join(", "));
                    self.out.push_str(" }");
                }
            }
        }
        self.out.push_str(") => ");
        match &arrow.body {
            ArrowBody::Expr(body) if matches!(**body, Expr::Object(_)) => {
                self.out.push('(');
                self.expr(body);
                self.out.push(')');
            }
            ArrowBody::Expr(body) => self.expr(body),
            ArrowBody::Block(statements) => {
                self.out.push_str("{\n");
                self.depth += 1;
                for statement in statements {
                    self.statement(statement);
                }
                self.depth -= 1;
                self.line_start();
                self.out.push('}');
            }
        }
    }

    fn helper(&mut self, helper: &Helper) {
        match helper {
            Helper::NewStack => self.out.push_str("[]"),
            Helper::RecordAsParent { stack } => self.out.push_str(&format!(
                "(source) => {{ {stack}.unshift(source); return source; }}"
            )),
            Helper::RecordExpression { stack } => self.out.push_str(&format!(
                "(location, value, isExpression, isLast) => {{ \
                 const parent = {stack}[0]; \
                 if (parent) {{ \
                 (parent.expressions = parent.expressions || []).push({{ location, value, isExpression }}); \
                 if (isLast) {stack}.shift(); \
                 }} \
                 return value; }}"
            )),
        }
    }

    fn element(&mut self, element: &JsxElement) {
        self.out.push('<');
        self.out.push_str(&element.name);
        for attribute in &element.attributes {
            self.out.push(' ');
            match attribute {
                JsxAttribute::Named { name, value } => {
                    self.out.push_str(name);
                    match value {
                        None => {}
                        Some(JsxAttrValue::Str(raw)) => {
                            let quote = if raw.contains('"') { '\'' } else { '"' };
                            self.out.push('=');
                            self.out.push(quote);
                            self.out.push_str(raw);
                            self.out.push(quote);
                        }
                        Some(JsxAttrValue::Expr(expr)) => {
                            self.out.push_str("={");
                            self.expr(expr);
                            self.out.push('}');
                        }
                    }
                }
                JsxAttribute::Spread(expr) => {
                    self.out.push_str("{...");
                    self.expr(expr);
                    self.out.push('}');
                }
            }
        }
        let Some(children) = &element.children else {
            self.out.push_str(" />");
            return;
        };
        self.out.push('>');
        for child in children {
            match child {
                JsxChild::Text(text) => self.out.push_str(&text.raw),
                JsxChild::Expr(container) => {
                    self.out.push('{');
                    if let Some(expr) = &container.expr {
                        self.expr(expr);
                    }
                    self.out.push('}');
                }
                JsxChild::Element(nested) => self.element(nested),
            }
        }
        self.out.push_str("</");
        self.out.push_str(&element.name);
        self.out.push('>');
    }
}
