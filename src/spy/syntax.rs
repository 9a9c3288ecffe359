//! Markup module syntax: tokens, AST, parser and traversal.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod tokens;
pub mod visit;

pub use ast::Module;
pub use error::ParseError;
pub use lexer::{tokenize, tokenize_with_spans};
pub use parser::{parse_expression, parse_module};
pub use tokens::Token;
