//! Structured-object tokenizer.
//!
//! Tokens are context-free so a single Logos enum covers the whole syntax.
//! String literals are only recognised when every escape is valid; a string
//! with a bad escape or a missing closing quote lexes as `BAD_TOKEN`s and the
//! parser reports it.

use logos::Logos;

use super::Token;
use crate::syntax_kind::SyntaxKind;

/// Token kinds produced by the Logos lexer for the structured-object syntax.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[regex(r#""([^"\\\x00-\x1F]|\\["\\/bfnrt]|\\u[0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F])*""#)]
    String,

    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,
}

impl ObjectToken {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            ObjectToken::Whitespace => SyntaxKind::WHITESPACE,
            ObjectToken::LBrace => SyntaxKind::L_BRACE,
            ObjectToken::RBrace => SyntaxKind::R_BRACE,
            ObjectToken::LBracket => SyntaxKind::L_BRACKET,
            ObjectToken::RBracket => SyntaxKind::R_BRACKET,
            ObjectToken::Colon => SyntaxKind::COLON,
            ObjectToken::Comma => SyntaxKind::COMMA,
            ObjectToken::String => SyntaxKind::STRING,
            ObjectToken::Number => SyntaxKind::NUMBER,
            ObjectToken::True => SyntaxKind::TRUE_KW,
            ObjectToken::False => SyntaxKind::FALSE_KW,
            ObjectToken::Null => SyntaxKind::NULL_KW,
        }
    }
}

/// Lex structured-object source into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex_object(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = ObjectToken::lexer(input);

    while let Some(result) = lexer.next() {
        let kind = match result {
            Ok(token_kind) => token_kind.to_syntax_kind(),
            Err(()) => SyntaxKind::BAD_TOKEN,
        };
        tokens.push(Token {
            kind,
            text: lexer.slice(),
        });
    }

    tokens
}
