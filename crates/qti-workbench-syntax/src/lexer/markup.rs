//! Markup tokenizer.
//!
//! Markup is context sensitive: `name="v"` means something inside a tag and
//! is plain character data outside one. The lexer therefore runs in two
//! modes and switches between them with [`logos::Lexer::morph`]:
//!
//! - **content mode** ([`ContentToken`]) between tags: text runs, comments,
//!   CDATA sections, processing instructions, and the `<` / `</` that open a
//!   tag
//! - **tag mode** ([`TagToken`]) after `<` or `</` until the closing `>` or
//!   `/>`: names, `=`, quoted values, whitespace
//!
//! A `<` met while still in tag mode (an unterminated tag) hands control back
//! to content mode without consuming it, so the next tag still lexes cleanly.

use logos::{Lexer, Logos};

use super::Token;
use crate::syntax_kind::SyntaxKind;

/// Tokens between tags.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentToken {
    /// `<!-- ... -->`
    #[token("<!--", |lex| bump_past(lex, "-->"))]
    Comment,

    /// `<![CDATA[ ... ]]>`
    #[token("<![CDATA[", |lex| bump_past(lex, "]]>"))]
    CData,

    /// `<? ... ?>`
    #[token("<?", |lex| bump_past(lex, "?>"))]
    ProcessingInstruction,

    /// `<!DOCTYPE ...>`
    #[token("<!", |lex| bump_past(lex, ">"))]
    Doctype,

    /// `</` opening an end tag
    #[token("</")]
    LAngleSlash,

    /// `<` opening a start tag
    #[token("<")]
    LAngle,

    /// Character data
    #[regex(r"[^<]+")]
    Text,
}

impl ContentToken {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            ContentToken::Comment => SyntaxKind::COMMENT,
            ContentToken::CData => SyntaxKind::CDATA,
            ContentToken::ProcessingInstruction => SyntaxKind::PROCESSING_INSTRUCTION,
            ContentToken::Doctype => SyntaxKind::DOCTYPE,
            ContentToken::LAngleSlash => SyntaxKind::L_ANGLE_SLASH,
            ContentToken::LAngle => SyntaxKind::L_ANGLE,
            ContentToken::Text => SyntaxKind::TEXT,
        }
    }
}

/// Tokens inside a start or end tag.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token(">")]
    RAngle,

    #[token("/>")]
    SlashRAngle,

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    Quoted,

    #[regex(r#"[^\s<>/="']+"#)]
    Name,
}

impl TagToken {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TagToken::Whitespace => SyntaxKind::WHITESPACE,
            TagToken::RAngle => SyntaxKind::R_ANGLE,
            TagToken::SlashRAngle => SyntaxKind::SLASH_R_ANGLE,
            TagToken::Eq => SyntaxKind::EQ,
            TagToken::Quoted => SyntaxKind::QUOTED,
            TagToken::Name => SyntaxKind::NAME,
        }
    }
}

/// Extend the current token past `terminator`.
///
/// When the terminator never appears the token swallows the rest of the
/// input and is reported as an error, so an unterminated comment becomes a
/// single `BAD_TOKEN` rather than a cascade of bogus tags.
fn bump_past(lex: &mut Lexer<'_, ContentToken>, terminator: &str) -> bool {
    match lex.remainder().find(terminator) {
        Some(index) => {
            lex.bump(index + terminator.len());
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Lex markup into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex_markup(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(input);

    while let Some(result) = content.next() {
        let kind = match result {
            Ok(token_kind) => token_kind.to_syntax_kind(),
            Err(()) => SyntaxKind::BAD_TOKEN,
        };
        tokens.push(Token {
            kind,
            text: content.slice(),
        });

        if matches!(kind, SyntaxKind::L_ANGLE | SyntaxKind::L_ANGLE_SLASH) {
            let mut tag = content.morph::<TagToken>();
            while !tag.remainder().starts_with('<') {
                let Some(result) = tag.next() else {
                    break;
                };
                let kind = match result {
                    Ok(token_kind) => token_kind.to_syntax_kind(),
                    Err(()) => SyntaxKind::BAD_TOKEN,
                };
                tokens.push(Token {
                    kind,
                    text: tag.slice(),
                });
                if matches!(kind, SyntaxKind::R_ANGLE | SyntaxKind::SLASH_R_ANGLE) {
                    break;
                }
            }
            content = tag.morph();
        }
    }

    tokens
}
