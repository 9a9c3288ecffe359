//! Parser for markup modules using chumsky
//!
//! The parser works over `(Token, byte range)` pairs. Code positions skip
//! whitespace, line breaks and comments (see [`trivia`]); markup children do
//! not, because whitespace inside markup is text. Text and string literals are
//! extracted from the shared source by byte range.
//!
//! Supported syntax is a small JavaScript subset with embedded markup:
//!
//! - `import x, { a as b } from "m";` and `import * as ns from "m";`
//! - `export? const|let|var name = expr;` (semicolons optional)
//! - arrow functions with expression or block bodies (`const` / `return` / expression statements)
//! - member access, calls, object and array literals, strings, numbers, `true`,
//!   `false`, `null`, `this`, identifiers
//! - markup elements with string, expression, bare and spread attributes,
//!   text children, `{expr}` children and nested elements

use chumsky::prelude::*;
use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;

use super::ast::{
    ArrowBody, ArrowFunction, ConstDecl, Expr, Import, ImportBinding, Imported, JsxAttrValue,
    JsxAttribute, JsxChild, JsxElement, JsxExprContainer, JsxText, Module, Param, Property,
    PropertyValue, Statement,
};
use super::error::ParseError;
use super::lexer::tokenize_with_spans;
use super::tokens::{is_reserved, Token};

/// Type alias for token with span
type TokenSpan = (Token, Range<usize>);

/// Type alias for parser error
type ParserError = Simple<TokenSpan>;

/// Parse a module from source text
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    let tokens = tokenize_with_spans(source);
    let shared = Arc::new(source.to_string());
    module(shared).parse(tokens).map_err(|errors| {
        errors
            .first()
            .map(|error| ParseError::from_simple(source, error))
            .unwrap_or_else(|| ParseError::Syntax {
                message: "unknown parse failure".to_string(),
                range: 0..0,
                position: Default::default(),
                source_context: String::new(),
            })
    })
}

/// Parse a single expression (used by tests and the CLI `--props` handling)
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize_with_spans(source);
    let shared = Arc::new(source.to_string());
    expression(shared)
        .then_ignore(trivia())
        .then_ignore(end())
        .parse(tokens)
        .map_err(|errors| match errors.first() {
            Some(error) => ParseError::from_simple(source, error),
            None => ParseError::Syntax {
                message: "unknown parse failure".to_string(),
                range: 0..0,
                position: Default::default(),
                source_context: String::new(),
            },
        })
}

fn slice(source: &str, range: Range<usize>) -> &str {
    source.get(range).unwrap_or("")
}

fn unexpected(span: Range<usize>, found: TokenSpan) -> ParserError {
    ParserError::expected_input_found(span, Vec::new(), Some(found))
}

/// Match a specific token, yielding its byte range
fn token(t: Token) -> impl Parser<TokenSpan, Range<usize>, Error = ParserError> + Clone {
    filter(move |(tok, _): &TokenSpan| tok == &t).map(|(_, range)| range)
}

fn keyword(kw: &'static str) -> impl Parser<TokenSpan, Range<usize>, Error = ParserError> + Clone {
    filter(move |(tok, _): &TokenSpan| tok.is_keyword(kw)).map(|(_, range)| range)
}

/// Whitespace, line breaks and comments between code tokens
fn trivia() -> impl Parser<TokenSpan, (), Error = ParserError> + Clone {
    let line_comment = token(Token::Slash)
        .then(token(Token::Slash))
        .then(filter(|(t, _): &TokenSpan| *t != Token::Newline).repeated())
        .ignored();
    let block_comment = token(Token::Slash)
        .then(token(Token::Star))
        .then(take_until(token(Token::Star).then(token(Token::Slash))))
        .ignored();

    filter(|(t, _): &TokenSpan| t.is_whitespace())
        .ignored()
        .or(line_comment)
        .or(block_comment)
        .repeated()
        .ignored()
}

/// A code token, preceded by optional trivia
fn tok(t: Token) -> impl Parser<TokenSpan, Range<usize>, Error = ParserError> + Clone {
    trivia().ignore_then(token(t))
}

fn kw(word: &'static str) -> impl Parser<TokenSpan, Range<usize>, Error = ParserError> + Clone {
    trivia().ignore_then(keyword(word))
}

/// A binding name (reserved words excluded), preceded by optional trivia
fn name() -> impl Parser<TokenSpan, (String, Range<usize>), Error = ParserError> + Clone {
    trivia().ignore_then(filter_map(|span, (tok, range): TokenSpan| match tok {
        Token::Ident(name) if !is_reserved(&name) => Ok((name, range)),
        tok => Err(unexpected(span, (tok, range))),
    }))
}

/// Any identifier, reserved words included (property names, import names)
fn any_name() -> impl Parser<TokenSpan, String, Error = ParserError> + Clone {
    trivia().ignore_then(filter_map(|span, (tok, range): TokenSpan| match tok {
        Token::Ident(name) => Ok(name),
        tok => Err(unexpected(span, (tok, range))),
    }))
}

fn number() -> impl Parser<TokenSpan, f64, Error = ParserError> + Clone {
    filter_map(|span, (tok, range): TokenSpan| match tok {
        Token::Number(text) => text
            .parse::<f64>()
            .map_err(|e| ParserError::custom(span, e.to_string())),
        tok => Err(unexpected(span, (tok, range))),
    })
}

fn unescape(text: &str) -> String {
    let mut chars = text.chars();
    let mut out = String::with_capacity(text.len());
    match chars.next() {
        Some('n') => out.push('\n'),
        Some('t') => out.push('\t'),
        Some('r') => out.push('\r'),
        Some('0') => out.push('\0'),
        Some(c) => out.push(c),
        None => {}
    }
    out.extend(chars);
    out
}

/// A JavaScript string literal in either quote style, with escapes resolved
fn quoted(
    source: Arc<String>,
    quote: Token,
) -> impl Parser<TokenSpan, (String, Range<usize>), Error = ParserError> + Clone {
    let escape_source = source.clone();
    let escape = token(Token::Backslash)
        .ignore_then(filter(|(t, _): &TokenSpan| *t != Token::Newline))
        .map(move |(_, range)| unescape(slice(&escape_source, range)));
    let close = quote.clone();
    let plain = filter(move |(t, _): &TokenSpan| {
        *t != close && *t != Token::Backslash && *t != Token::Newline
    })
    .map(move |(_, range)| slice(&source, range).to_string());

    token(quote.clone())
        .then(escape.or(plain).repeated())
        .then(token(quote))
        .map(|((open, parts), close)| (parts.concat(), open.start..close.end))
}

fn string_literal(
    source: Arc<String>,
) -> impl Parser<TokenSpan, (String, Range<usize>), Error = ParserError> + Clone {
    quoted(source.clone(), Token::DoubleQuote).or(quoted(source, Token::SingleQuote))
}

/// A markup attribute string: raw text between quotes, no escapes
fn attr_string(source: Arc<String>) -> impl Parser<TokenSpan, String, Error = ParserError> + Clone {
    let raw = |quote: Token| {
        let body = quote.clone();
        token(quote.clone())
            .then_ignore(filter(move |(t, _): &TokenSpan| *t != body).repeated())
            .then(token(quote))
    };
    raw(Token::DoubleQuote)
        .or(raw(Token::SingleQuote))
        .map(move |(open, close)| slice(&source, open.end..close.start).to_string())
}

/// Element and attribute names: `div`, `my-widget`, `Ui.Button`, `aria-label`
fn jsx_name() -> impl Parser<TokenSpan, String, Error = ParserError> + Clone {
    let head = filter_map(|span, (tok, range): TokenSpan| match tok {
        Token::Ident(name) => Ok(name),
        tok => Err(unexpected(span, (tok, range))),
    });
    let separator = filter_map(|span, (tok, range): TokenSpan| match tok {
        Token::Dot => Ok(".".to_string()),
        Token::Punct(p) if p == "-" => Ok(p),
        tok => Err(unexpected(span, (tok, range))),
    });
    let segment = filter_map(|span, (tok, range): TokenSpan| match tok {
        Token::Ident(s) | Token::Number(s) => Ok(s),
        tok => Err(unexpected(span, (tok, range))),
    });

    head.then(separator.then(segment).repeated())
        .map(|(head, rest)| {
            rest.into_iter().fold(head, |mut acc, (sep, seg)| {
                acc.push_str(&sep);
                acc.push_str(&seg);
                acc
            })
        })
}

enum Tail {
    SelfClosing(Range<usize>),
    Children(Vec<JsxChild>, String, Range<usize>),
}

/// A markup element, children included
fn jsx_element<E>(
    source: Arc<String>,
    expr: E,
) -> impl Parser<TokenSpan, JsxElement, Error = ParserError> + Clone
where
    E: Parser<TokenSpan, Expr, Error = ParserError> + Clone + 'static,
{
    recursive(move |element| {
        let attr_value = trivia()
            .ignore_then(attr_string(source.clone()))
            .map(JsxAttrValue::Str)
            .or(tok(Token::LBrace)
                .ignore_then(expr.clone())
                .then_ignore(tok(Token::RBrace))
                .map(JsxAttrValue::Expr));

        let attribute = tok(Token::LBrace)
            .ignore_then(tok(Token::Spread))
            .ignore_then(expr.clone())
            .then_ignore(tok(Token::RBrace))
            .map(JsxAttribute::Spread)
            .or(trivia()
                .ignore_then(jsx_name())
                .then(tok(Token::Eq).ignore_then(attr_value).or_not())
                .map(|(name, value)| JsxAttribute::Named { name, value }));

        let text_source = source.clone();
        let text = filter(|(t, _): &TokenSpan| !t.ends_markup_text())
            .repeated()
            .at_least(1)
            .map(move |tokens: Vec<TokenSpan>| {
                let start = tokens.first().map(|(_, r)| r.start).unwrap_or(0);
                let end = tokens.last().map(|(_, r)| r.end).unwrap_or(start);
                JsxChild::Text(JsxText {
                    raw: slice(&text_source, start..end).to_string(),
                    range: start..end,
                })
            });

        let container = token(Token::LBrace)
            .then(expr.clone().or_not())
            .then(tok(Token::RBrace))
            .map(|((open, expr), close)| {
                JsxChild::Expr(JsxExprContainer {
                    expr,
                    range: open.start..close.end,
                })
            });

        let child = container
            .or(element.clone().map(JsxChild::Element))
            .or(text);

        let close_tag = token(Token::Lt)
            .then(tok(Token::Slash))
            .ignore_then(trivia().ignore_then(jsx_name()))
            .then(tok(Token::Gt));

        let tail = tok(Token::Slash)
            .ignore_then(tok(Token::Gt))
            .map(Tail::SelfClosing)
            .or(tok(Token::Gt)
                .ignore_then(child.repeated())
                .then(close_tag)
                .map(|(children, (closing, gt))| Tail::Children(children, closing, gt)));

        token(Token::Lt)
            .then(trivia().ignore_then(jsx_name()))
            .then(attribute.repeated())
            .then(tail)
            .try_map(|(((lt, name), attributes), tail), span| match tail {
                Tail::SelfClosing(gt) => Ok(JsxElement {
                    name,
                    attributes,
                    children: None,
                    range: lt.start..gt.end,
                }),
                Tail::Children(_, closing, _) if closing != name => Err(ParserError::custom(
                    span,
                    format!("expected closing tag </{}>, found </{}>", name, closing),
                )),
                Tail::Children(children, _, gt) => Ok(JsxElement {
                    name,
                    attributes,
                    children: Some(children),
                    range: lt.start..gt.end,
                }),
            })
            .labelled("markup element")
    })
}

/// `export? const name = init;` (also accepts `let` and `var`)
fn declaration<E>(expr: E) -> impl Parser<TokenSpan, Statement, Error = ParserError> + Clone
where
    E: Parser<TokenSpan, Expr, Error = ParserError> + Clone,
{
    kw("export")
        .or_not()
        .then_ignore(kw("const").or(kw("let")).or(kw("var")))
        .then(name())
        .then_ignore(tok(Token::Eq))
        .then(expr)
        .then_ignore(tok(Token::Semi).or_not())
        .map(|((export, (name, _)), init)| {
            Statement::Const(ConstDecl {
                exported: export.is_some(),
                name,
                init,
            })
        })
        .labelled("declaration")
}

fn expression_statement<E>(expr: E) -> impl Parser<TokenSpan, Statement, Error = ParserError> + Clone
where
    E: Parser<TokenSpan, Expr, Error = ParserError> + Clone,
{
    expr.then_ignore(tok(Token::Semi).or_not())
        .map(Statement::Expr)
}

enum Postfix {
    Member(String),
    Call(Vec<Expr>),
}

/// Any expression
pub(crate) fn expression(
    source: Arc<String>,
) -> impl Parser<TokenSpan, Expr, Error = ParserError> + Clone {
    recursive(move |expr| {
        let element = jsx_element(source.clone(), expr.clone()).boxed();

        let literal = trivia().ignore_then(choice((
            string_literal(source.clone()).map(|(value, _)| Expr::Str(value)),
            number().map(Expr::Number),
            keyword("true").to(Expr::Bool(true)),
            keyword("false").to(Expr::Bool(false)),
            keyword("null").to(Expr::Null),
            keyword("this").to(Expr::This),
        )));

        let param = name()
            .map(|(name, _)| Param::Ident(name))
            .or(tok(Token::LBrace)
                .ignore_then(
                    name()
                        .map(|(name, _)| name)
                        .separated_by(tok(Token::Comma))
                        .allow_trailing(),
                )
                .then_ignore(tok(Token::RBrace))
                .map(Param::Destructure));

        let params = tok(Token::LParen)
            .ignore_then(param.separated_by(tok(Token::Comma)).allow_trailing())
            .then_ignore(tok(Token::RParen))
            .or(name().map(|(name, _)| vec![Param::Ident(name)]));

        let block_statement = declaration(expr.clone())
            .or(kw("return")
                .ignore_then(expr.clone().or_not())
                .then_ignore(tok(Token::Semi).or_not())
                .map(Statement::Return))
            .or(expression_statement(expr.clone()));

        let body = tok(Token::LBrace)
            .ignore_then(block_statement.repeated())
            .then_ignore(tok(Token::RBrace))
            .map(ArrowBody::Block)
            .or(expr.clone().map(|e| ArrowBody::Expr(Box::new(e))));

        let arrow = params
            .then_ignore(tok(Token::Arrow))
            .then(body)
            .map(|(params, body)| Expr::Arrow(Rc::new(ArrowFunction { params, body })))
            .boxed();

        let paren = tok(Token::LParen)
            .ignore_then(expr.clone())
            .then_ignore(tok(Token::RParen))
            .map(|e| Expr::Paren(Box::new(e)));

        let array = tok(Token::LBracket)
            .ignore_then(expr.clone().separated_by(tok(Token::Comma)).allow_trailing())
            .then_ignore(tok(Token::RBracket))
            .map(Expr::Array);

        let key = any_name().or(trivia()
            .ignore_then(string_literal(source.clone()))
            .map(|(key, _)| key));
        let property = choice((
            tok(Token::Spread)
                .ignore_then(expr.clone())
                .map(|e| Property {
                    key: String::new(),
                    value: PropertyValue::Spread(e),
                }),
            key.then_ignore(tok(Token::Colon))
                .then(expr.clone())
                .map(|(key, value)| Property {
                    key,
                    value: PropertyValue::Value(value),
                }),
            name().map(|(key, _)| Property {
                key,
                value: PropertyValue::Shorthand,
            }),
        ));
        let object = tok(Token::LBrace)
            .ignore_then(property.separated_by(tok(Token::Comma)).allow_trailing())
            .then_ignore(tok(Token::RBrace))
            .map(Expr::Object);

        let markup = trivia()
            .ignore_then(element)
            .map(|element| Expr::Jsx(Box::new(element)));

        let atom = choice((
            arrow,
            paren.boxed(),
            literal.boxed(),
            markup.boxed(),
            array.boxed(),
            object.boxed(),
            name().map(|(name, _)| Expr::Ident(name)).boxed(),
        ));

        let postfix = tok(Token::Dot)
            .ignore_then(any_name())
            .map(Postfix::Member)
            .or(tok(Token::LParen)
                .ignore_then(expr.clone().separated_by(tok(Token::Comma)).allow_trailing())
                .then_ignore(tok(Token::RParen))
                .map(Postfix::Call));

        atom.then(postfix.repeated())
            .foldl(|lhs, op| match op {
                Postfix::Member(property) => Expr::Member {
                    object: Box::new(lhs),
                    property,
                },
                Postfix::Call(args) => Expr::call(lhs, args),
            })
            .labelled("expression")
    })
}

fn import(source: Arc<String>) -> impl Parser<TokenSpan, Statement, Error = ParserError> + Clone {
    let named_binding = any_name()
        .then(kw("as").ignore_then(name()).or_not())
        .map(|(imported, local)| ImportBinding {
            local: local.map(|(local, _)| local).unwrap_or_else(|| imported.clone()),
            imported: Imported::Named(imported),
        });
    let named = tok(Token::LBrace)
        .ignore_then(named_binding.separated_by(tok(Token::Comma)).allow_trailing())
        .then_ignore(tok(Token::RBrace));
    let namespace = tok(Token::Star)
        .ignore_then(kw("as"))
        .ignore_then(name())
        .map(|(local, _)| {
            vec![ImportBinding {
                imported: Imported::Namespace,
                local,
            }]
        });
    let default = name().map(|(local, _)| {
        vec![ImportBinding {
            imported: Imported::Default,
            local,
        }]
    });
    let clause = default
        .then(
            tok(Token::Comma)
                .ignore_then(named.clone().or(namespace.clone()))
                .or_not(),
        )
        .map(|(mut bindings, rest)| {
            bindings.extend(rest.unwrap_or_default());
            bindings
        })
        .or(named)
        .or(namespace);

    kw("import")
        .then(clause.then_ignore(kw("from")).or_not())
        .then(trivia().ignore_then(string_literal(source)))
        .then(tok(Token::Semi).or_not())
        .map(|(((start, bindings), (specifier, spec_range)), semi)| {
            let end = semi.map(|r| r.end).unwrap_or(spec_range.end);
            Statement::Import(Import {
                specifier,
                bindings: bindings.unwrap_or_default(),
                range: start.start..end,
            })
        })
        .labelled("import")
}

fn module(source: Arc<String>) -> impl Parser<TokenSpan, Module, Error = ParserError> {
    let expr = expression(source.clone());
    let statement = import(source)
        .or(declaration(expr.clone()))
        .or(expression_statement(expr));

    statement
        .repeated()
        .then_ignore(trivia())
        .then_ignore(end())
        .map(Module::new)
}
