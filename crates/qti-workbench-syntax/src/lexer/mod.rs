//! # Lexer - Tokenizing QTI Source
//!
//! This module provides the first stage of parsing: breaking source text into
//! tokens using the [Logos] lexer generator. There is one tokenizer per
//! surface syntax:
//!
//! - [`markup`] - the element/attribute syntax (QTI XML)
//! - [`object`] - the nested key/value syntax (QTI JSON)
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! The most important property of both lexers is that **every byte in the
//! input appears in exactly one token**. We never skip or discard characters,
//! even for garbage input. This is what makes round-tripping possible:
//!
//! ```
//! use qti_workbench_syntax::lexer::lex_markup;
//!
//! let input = "<p>Hello &amp; welcome</p>\n";
//! let tokens = lex_markup(input);
//!
//! // Concatenating all token texts gives back the original
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Why Separate Token Enums?
//!
//! Logos requires its own enum for the `#[derive(Logos)]` macro, while Rowan
//! uses our [`SyntaxKind`]. Each Logos enum has a `to_syntax_kind` method
//! converting between them. Characters Logos rejects become
//! [`SyntaxKind::BAD_TOKEN`] so the parser can report them.
//!
//! [`SyntaxKind`]: crate::syntax_kind::SyntaxKind
//! [`SyntaxKind::BAD_TOKEN`]: crate::syntax_kind::SyntaxKind::BAD_TOKEN

pub mod markup;
pub mod object;

pub use markup::lex_markup;
pub use object::lex_object;

use crate::syntax_kind::SyntaxKind;

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

/// Pair each token with its byte span in the source.
pub fn with_spans<'a>(tokens: &[Token<'a>]) -> Vec<(Token<'a>, std::ops::Range<usize>)> {
    let mut offset = 0;
    tokens
        .iter()
        .map(|token| {
            let start = offset;
            offset += token.text.len();
            (token.clone(), start..offset)
        })
        .collect()
}
