//! Token definitions for markup modules
//!
//! The token set is deliberately coarse: it only separates the characters the
//! parser needs to make structural decisions (markup brackets, braces, quotes,
//! comment starters) and lumps everything else into identifiers, numbers and
//! punctuation runs. Markup text and string literals are rebuilt from the
//! source slices covered by their tokens, so nothing is lost by that coarseness.
use logos::Logos;
use serde::Serialize;

/// All possible tokens in a markup module
#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone, Serialize)]
pub enum Token {
    // Markup and grouping
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("/")]
    Slash,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Separators and operators
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token("...")]
    Spread,
    #[token("=")]
    Eq,
    #[token("=>")]
    Arrow,
    #[token("*")]
    Star,

    // String delimiters and escapes
    #[token("\"")]
    DoubleQuote,
    #[token("'")]
    SingleQuote,
    #[token("\\")]
    Backslash,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),

    // Whitespace (excluding newlines)
    #[regex(r"[ \t]+")]
    Whitespace,

    // Line breaks, either convention
    #[regex(r"\r?\n")]
    Newline,

    // Anything else that is not one of the characters above
    #[regex(r#"[^ \t\r\n<>/{}()\[\],:;.=*"'\\A-Za-z0-9_$]+"#, |lex| lex.slice().to_string())]
    Punct(String),

    // Produced by the lexer wrapper for input logos cannot match
    Unknown,
}

impl Token {
    /// Whitespace and line breaks
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace | Token::Newline)
    }

    /// Tokens that end a run of markup text
    pub fn ends_markup_text(&self) -> bool {
        matches!(self, Token::Lt | Token::LBrace | Token::RBrace)
    }

    /// Check if this token is the given keyword
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Ident(name) if name == keyword)
    }
}

/// Identifiers with a fixed meaning that cannot be used as bindings
pub const KEYWORDS: &[&str] = &[
    "import", "export", "from", "const", "let", "var", "return", "true", "false", "null", "this",
    "function",
];

pub fn is_reserved(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).map(|t| t.unwrap_or(Token::Unknown)).collect()
    }

    #[test]
    fn test_markup_tokens() {
        assert_eq!(
            lex("<div/>"),
            vec![
                Token::Lt,
                Token::Ident("div".to_string()),
                Token::Slash,
                Token::Gt
            ]
        );
    }

    #[test]
    fn test_arrow_beats_eq() {
        assert_eq!(
            lex("a=>b = c"),
            vec![
                Token::Ident("a".to_string()),
                Token::Arrow,
                Token::Ident("b".to_string()),
                Token::Whitespace,
                Token::Eq,
                Token::Whitespace,
                Token::Ident("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_spread_and_dot() {
        assert_eq!(
            lex("...a.b"),
            vec![
                Token::Spread,
                Token::Ident("a".to_string()),
                Token::Dot,
                Token::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(lex("42"), vec![Token::Number("42".to_string())]);
        assert_eq!(lex("4.5"), vec![Token::Number("4.5".to_string())]);
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(lex("\n"), vec![Token::Newline]);
        assert_eq!(lex("\r\n"), vec![Token::Newline]);
    }

    #[test]
    fn test_punctuation_runs() {
        assert_eq!(
            lex("a-b!?"),
            vec![
                Token::Ident("a".to_string()),
                Token::Punct("-".to_string()),
                Token::Ident("b".to_string()),
                Token::Punct("!?".to_string()),
            ]
        );
    }

    #[test]
    fn test_non_ascii_text_is_punct() {
        assert_eq!(lex("é"), vec![Token::Punct("é".to_string())]);
    }

    #[test]
    fn test_keywords() {
        assert!(Token::Ident("const".to_string()).is_keyword("const"));
        assert!(!Token::Ident("constant".to_string()).is_keyword("const"));
        assert!(is_reserved("return"));
        assert!(!is_reserved("props"));
    }
}
