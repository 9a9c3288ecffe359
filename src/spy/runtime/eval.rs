//! Evaluator for markup modules
//!
//! Elements evaluate the way `createElement` would: attributes in order, then
//! children. `__self` and `__source` are lifted out of the props onto the
//! element.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::spy::instrument::{SELF_ATTRIBUTE, SOURCE_ATTRIBUTE};
use crate::spy::syntax::ast::{
    ArrowBody, ArrowFunction, Expr, Helper, Imported, JsxAttrValue, JsxAttribute, JsxChild,
    JsxElement, LocationLiteral, Module, Param, PropertyValue, Statement,
};

use super::location::{SourceLocation, SourceRecord, UNKNOWN_FILE};
use super::stack::StackHandle;
use super::value::{Builtin, Element, ElementType, Value};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{0} is not defined")]
    UndefinedVariable(String),

    #[error("cannot read property '{property}' of {target}")]
    PropertyOfNullish { property: String, target: String },

    #[error("{0} is not a function")]
    NotCallable(String),

    #[error("element type '{name}' is not a component (found {found})")]
    InvalidComponent { name: String, found: String },

    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Lexical scope
pub struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Scope>>,
    stack: StackHandle,
}

impl Scope {
    pub fn root(stack: StackHandle) -> Rc<Self> {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: None,
            stack,
        })
    }

    pub fn child(parent: &Rc<Scope>) -> Rc<Self> {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
            stack: parent.stack.clone(),
        })
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    pub fn declare(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }
}

/// A closure over an arrow function
pub struct Function {
    pub name: Option<String>,
    pub arrow: Rc<ArrowFunction>,
    pub env: Rc<Scope>,
}

impl Function {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "anonymous".to_string())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.arrow.params.len())
            .finish()
    }
}

/// An evaluated module
#[derive(Debug, Clone)]
pub struct ModuleInstance {
    pub exports: BTreeMap<String, Value>,
    /// The stack the module's generated helpers are bound to
    pub stack: StackHandle,
}

impl ModuleInstance {
    pub fn export(&self, name: &str) -> Option<&Value> {
        self.exports.get(name)
    }
}

/// Loads modules and resolves imports between them
#[derive(Default)]
pub struct Interpreter {
    shared_stack: Option<StackHandle>,
    modules: HashMap<String, BTreeMap<String, Value>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every module loaded afterwards records into `stack` instead of its own
    pub fn with_shared_stack(stack: StackHandle) -> Self {
        Self {
            shared_stack: Some(stack),
            modules: HashMap::new(),
        }
    }

    /// Make `exports` importable under `specifier`
    pub fn register_module(&mut self, specifier: impl Into<String>, exports: BTreeMap<String, Value>) {
        self.modules.insert(specifier.into(), exports);
    }

    pub fn load(&self, module: &Module) -> EvalResult<ModuleInstance> {
        let stack = self.shared_stack.clone().unwrap_or_default();
        let scope = Scope::root(stack.clone());
        let mut exports = BTreeMap::new();

        for statement in &module.body {
            match statement {
                Statement::Import(import) => {
                    let resolved = self.modules.get(&import.specifier);
                    if resolved.is_none() {
                        warn!(specifier = %import.specifier, "unresolved import, bindings are undefined");
                    }
                    for binding in &import.bindings {
                        let value = match (resolved, &binding.imported) {
                            (None, _) => Value::Undefined,
                            (Some(exports), Imported::Namespace) => Value::object(exports.clone()),
                            (Some(exports), Imported::Default) => {
                                exports.get("default").cloned().unwrap_or(Value::Undefined)
                            }
                            (Some(exports), Imported::Named(name)) => {
                                exports.get(name).cloned().unwrap_or(Value::Undefined)
                            }
                        };
                        scope.declare(binding.local.clone(), value);
                    }
                }
                Statement::Const(decl) => {
                    let value = eval_named(&decl.init, &decl.name, &scope)?;
                    if decl.exported {
                        exports.insert(decl.name.clone(), value.clone());
                    }
                    scope.declare(decl.name.clone(), value);
                }
                Statement::Expr(expr) => {
                    eval(expr, &scope)?;
                }
                Statement::Return(_) => {
                    return Err(EvalError::Unsupported("return outside of a function".to_string()))
                }
            }
        }

        debug!(exports = exports.len(), "loaded module");
        Ok(ModuleInstance { exports, stack })
    }
}

/// Arrow functions bound by a declaration take the declared name
fn eval_named(expr: &Expr, name: &str, scope: &Rc<Scope>) -> EvalResult<Value> {
    match expr {
        Expr::Arrow(arrow) => Ok(Value::Function(Rc::new(Function {
            name: Some(name.to_string()),
            arrow: arrow.clone(),
            env: scope.clone(),
        }))),
        other => eval(other, scope),
    }
}

pub fn eval(expr: &Expr, scope: &Rc<Scope>) -> EvalResult<Value> {
    match expr {
        Expr::Str(s) => Ok(Value::from(s.as_str())),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::This => Ok(Value::Undefined),
        Expr::Ident(name) if name == "undefined" => Ok(Value::Undefined),
        Expr::Ident(name) => scope
            .lookup(name)
            .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
        Expr::Member { object, property } => {
            let target = eval(object, scope)?;
            target
                .get(property)
                .ok_or_else(|| EvalError::PropertyOfNullish {
                    property: property.clone(),
                    target: target.type_name().to_string(),
                })
        }
        Expr::Call { callee, args } => {
            let callee = eval(callee, scope)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<EvalResult<Vec<_>>>()?;
            call_value(&callee, args)
        }
        Expr::Arrow(arrow) => Ok(Value::Function(Rc::new(Function {
            name: None,
            arrow: arrow.clone(),
            env: scope.clone(),
        }))),
        Expr::Object(properties) => {
            let mut fields = BTreeMap::new();
            for property in properties {
                match &property.value {
                    PropertyValue::Value(value) => {
                        fields.insert(property.key.clone(), eval(value, scope)?);
                    }
                    PropertyValue::Shorthand => {
                        let value = eval(&Expr::Ident(property.key.clone()), scope)?;
                        fields.insert(property.key.clone(), value);
                    }
                    PropertyValue::Spread(value) => spread_into(&mut fields, eval(value, scope)?)?,
                }
            }
            Ok(Value::object(fields))
        }
        Expr::Array(items) => Ok(Value::array(
            items
                .iter()
                .map(|item| eval(item, scope))
                .collect::<EvalResult<Vec<_>>>()?,
        )),
        Expr::Paren(inner) => eval(inner, scope),
        Expr::Jsx(element) => create_element(element, scope),
        Expr::Location(literal) => Ok(Value::Source(SourceRecord::new(location_of(literal, scope)))),
        Expr::Helper(helper) => eval_helper(helper, scope),
    }
}

fn location_of(literal: &LocationLiteral, scope: &Scope) -> SourceLocation {
    let file_name = scope
        .lookup(&literal.file)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_FILE.to_string());
    SourceLocation::new(file_name, literal.line_number, literal.pos, literal.end)
}

fn eval_helper(helper: &Helper, scope: &Rc<Scope>) -> EvalResult<Value> {
    let bound_stack = |name: &str| match scope.lookup(name) {
        Some(Value::Stack(stack)) => Ok(stack),
        Some(other) => Err(EvalError::Unsupported(format!(
            "'{}' is a {}, not an attribution stack",
            name,
            other.type_name()
        ))),
        None => Err(EvalError::UndefinedVariable(name.to_string())),
    };
    match helper {
        Helper::NewStack => Ok(Value::Stack(scope.stack.clone())),
        Helper::RecordAsParent { stack } => {
            Ok(Value::Builtin(Builtin::RecordAsParent(bound_stack(stack)?)))
        }
        Helper::RecordExpression { stack } => {
            Ok(Value::Builtin(Builtin::RecordExpression(bound_stack(stack)?)))
        }
    }
}

fn spread_into(fields: &mut BTreeMap<String, Value>, value: Value) -> EvalResult<()> {
    match value {
        Value::Object(source) => {
            fields.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(())
        }
        Value::Undefined | Value::Null => Ok(()),
        other => Err(EvalError::Unsupported(format!("spreading a {}", other.type_name()))),
    }
}

/// Call a function or builtin
pub fn call_value(callee: &Value, args: Vec<Value>) -> EvalResult<Value> {
    match callee {
        Value::Function(function) => call_function(function, args),
        Value::Builtin(builtin) => Ok(call_builtin(builtin, args)),
        other => Err(EvalError::NotCallable(format!("{:?}", other))),
    }
}

fn call_function(function: &Function, args: Vec<Value>) -> EvalResult<Value> {
    trace!(function = %function.display_name(), "call");
    let scope = Scope::child(&function.env);
    let mut args = args.into_iter();
    for param in &function.arrow.params {
        let arg = args.next().unwrap_or(Value::Undefined);
        match param {
            Param::Ident(name) => scope.declare(name.clone(), arg),
            Param::Destructure(names) => {
                for name in names {
                    let value = arg.get(name).ok_or_else(|| EvalError::PropertyOfNullish {
                        property: name.clone(),
                        target: arg.type_name().to_string(),
                    })?;
                    scope.declare(name.clone(), value);
                }
            }
        }
    }

    match &function.arrow.body {
        ArrowBody::Expr(expr) => eval(expr, &scope),
        ArrowBody::Block(statements) => {
            for statement in statements {
                match statement {
                    Statement::Const(decl) => {
                        let value = eval_named(&decl.init, &decl.name, &scope)?;
                        scope.declare(decl.name.clone(), value);
                    }
                    Statement::Expr(expr) => {
                        eval(expr, &scope)?;
                    }
                    Statement::Return(Some(expr)) => return eval(expr, &scope),
                    Statement::Return(None) => return Ok(Value::Undefined),
                    Statement::Import(_) => {
                        return Err(EvalError::Unsupported("import inside a function".to_string()))
                    }
                }
            }
            Ok(Value::Undefined)
        }
    }
}

fn call_builtin(builtin: &Builtin, args: Vec<Value>) -> Value {
    let mut args = args.into_iter();
    match builtin {
        Builtin::RecordAsParent(stack) => match args.next().unwrap_or(Value::Undefined) {
            Value::Source(record) => Value::Source(stack.record_as_parent(record)),
            other => match SourceLocation::from_value(&other) {
                Some(location) => Value::Source(stack.record_as_parent(SourceRecord::new(location))),
                None => {
                    warn!(found = other.type_name(), "record-as-parent without a location");
                    other
                }
            },
        },
        Builtin::RecordExpression(stack) => {
            let location = args
                .next()
                .and_then(|v| SourceLocation::from_value(&v))
                .unwrap_or_else(SourceLocation::unknown);
            let value = args.next().unwrap_or(Value::Undefined);
            let is_expression = args.next().map(|v| v.is_truthy()).unwrap_or(false);
            let is_last = args.next().map(|v| v.is_truthy()).unwrap_or(false);
            stack.record_expression(location, value, is_expression, is_last)
        }
    }
}

fn resolve_element_type(element: &JsxElement, scope: &Rc<Scope>) -> EvalResult<ElementType> {
    if element.is_host_tag() {
        return Ok(ElementType::Tag(Rc::from(element.name.as_str())));
    }
    let mut segments = element.name.split('.');
    let head = segments.next().unwrap_or_default();
    let mut value = scope
        .lookup(head)
        .ok_or_else(|| EvalError::UndefinedVariable(head.to_string()))?;
    for segment in segments {
        value = value.get(segment).ok_or_else(|| EvalError::PropertyOfNullish {
            property: segment.to_string(),
            target: value.type_name().to_string(),
        })?;
    }
    match value {
        Value::Function(function) => Ok(ElementType::Component(function)),
        other => Err(EvalError::InvalidComponent {
            name: element.name.clone(),
            found: other.type_name().to_string(),
        }),
    }
}

fn create_element(element: &JsxElement, scope: &Rc<Scope>) -> EvalResult<Value> {
    let element_type = resolve_element_type(element, scope)?;
    let mut props = BTreeMap::new();
    let mut owner = None;
    let mut source = None;

    for attribute in &element.attributes {
        match attribute {
            JsxAttribute::Named { name, value } => {
                let value = match value {
                    None => Value::Bool(true),
                    Some(JsxAttrValue::Str(s)) => Value::from(s.as_str()),
                    Some(JsxAttrValue::Expr(expr)) => eval(expr, scope)?,
                };
                match name.as_str() {
                    SELF_ATTRIBUTE => owner = Some(value),
                    SOURCE_ATTRIBUTE => source = Some(value),
                    _ => {
                        props.insert(name.clone(), value);
                    }
                }
            }
            JsxAttribute::Spread(expr) => spread_into(&mut props, eval(expr, scope)?)?,
        }
    }

    let mut children = Vec::new();
    for child in element.children() {
        match child {
            JsxChild::Text(text) => {
                let cooked = text.cooked();
                if !cooked.is_empty() {
                    children.push(Value::from(cooked));
                }
            }
            JsxChild::Expr(container) => {
                if let Some(expr) = &container.expr {
                    children.push(eval(expr, scope)?);
                }
            }
            JsxChild::Element(nested) => children.push(create_element(nested, scope)?),
        }
    }
    match children.len() {
        0 => {}
        1 => {
            props.insert("children".to_string(), children.remove(0));
        }
        _ => {
            props.insert("children".to_string(), Value::array(children));
        }
    }

    let mut created = Element::new(element_type, props);
    created.owner = owner;
    created.source = source;
    Ok(Value::element(created))
}
