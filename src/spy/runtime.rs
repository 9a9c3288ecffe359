//! Runtime side of attribution: values, the evaluator and the stack the
//! generated helpers record into.

pub mod eval;
pub mod location;
pub mod stack;
pub mod value;

pub use eval::{call_value, EvalError, EvalResult, Function, Interpreter, ModuleInstance};
pub use location::{ExpressionLocation, LocationWithExpressions, SourceLocation, SourceRecord};
pub use stack::{AttributionStack, StackHandle};
pub use value::{Builtin, Element, ElementType, Value};
