//! Parse errors

use chumsky::error::Simple;
use std::ops::Range;
use thiserror::Error;

use super::position::{LineIndex, Position};
use super::tokens::Token;

type TokenSpan = (Token, Range<usize>);

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Syntax error at {position}: {message}\n\n{source_context}")]
    Syntax {
        message: String,
        range: Range<usize>,
        position: Position,
        source_context: String,
    },
}

impl ParseError {
    pub fn range(&self) -> &Range<usize> {
        match self {
            ParseError::Syntax { range, .. } => range,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::Syntax { message, .. } => message,
        }
    }

    pub(crate) fn from_simple(source: &str, error: &Simple<TokenSpan>) -> Self {
        let range = match error.found() {
            Some((_, range)) => range.clone(),
            None => source.len()..source.len(),
        };
        let found = match error.found() {
            Some((token, _)) => format!("unexpected {}", describe(token)),
            None => "unexpected end of input".to_string(),
        };
        let message = match error.label() {
            Some(label) => format!("{} in {}", found, label),
            None => found,
        };
        let index = LineIndex::new(source);
        let position = index.position(range.start.min(source.len()));

        ParseError::Syntax {
            message,
            source_context: format_source_context(source, position.line),
            range,
            position,
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("identifier `{}`", name),
        Token::Number(n) => format!("number `{}`", n),
        Token::Punct(p) => format!("`{}`", p),
        Token::Newline => "line break".to_string(),
        Token::Whitespace => "whitespace".to_string(),
        Token::Unknown => "unrecognized character".to_string(),
        other => format!("{:?}", other),
    }
}

/// Format source code context around an error line
///
/// Shows 2 lines before the error, the error line with >> marker, and 2 lines after.
pub fn format_source_context(source: &str, error_line: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let start_line = error_line.saturating_sub(2);
    let end_line = (error_line + 3).min(lines.len());

    let mut context = String::new();
    for (line_num, line) in lines.iter().enumerate().take(end_line).skip(start_line) {
        let marker = if line_num == error_line { ">>" } else { "  " };
        context.push_str(&format!("{} {:3} | {}\n", marker, line_num + 1, line));
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_source_context() {
        let source = "line 1\nline 2\nline 3\nerror line\nline 5\nline 6\nline 7";
        let context = format_source_context(source, 3);

        assert!(context.contains("line 2"));
        assert!(context.contains(">>   4 | error line"));
        assert!(context.contains("line 6"));
        assert!(!context.contains("line 1"));
        assert!(!context.contains("line 7"));
    }
}
