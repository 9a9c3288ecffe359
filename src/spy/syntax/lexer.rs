//! Convenience functions for tokenizing markup modules.
//!
//! The actual tokenization is handled entirely by logos. Input that logos
//! cannot match is kept as [`Token::Unknown`] so that markup text around it
//! still covers every byte of the source.

use crate::spy::syntax::tokens::Token;
use logos::Logos;
use std::ops::Range;

/// Tokenize a string and collect all tokens
pub fn tokenize(source: &str) -> Vec<Token> {
    Token::lexer(source)
        .map(|result| result.unwrap_or(Token::Unknown))
        .collect()
}

/// Tokenize a string and collect tokens with their byte spans
pub fn tokenize_with_spans(source: &str) -> Vec<(Token, Range<usize>)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        tokens.push((result.unwrap_or(Token::Unknown), lexer.span()));
    }

    tokens
}
