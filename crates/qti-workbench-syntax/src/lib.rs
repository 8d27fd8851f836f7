//! # qti-workbench-syntax
//!
//! Lossless syntax trees for the two surface syntaxes QTI items are written
//! in: element/attribute **markup** and nested key/value **structured
//! objects**. Built on [Rowan] + [Logos] following the [rust-analyzer]
//! architecture model.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## What is a Lossless CST?
//!
//! A Concrete Syntax Tree preserves **every byte** of the source, including
//! whitespace, comments and the XML declaration. That gives the engine two
//! things it needs:
//!
//! - **Minimal edits**: an update can splice new text into exactly the byte
//!   range of the node it changes and leave the rest of the author's file alone
//! - **Accurate error reporting**: every error carries the byte range it
//!   applies to
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree
//!               (Logos)          (Grammar)        (GreenNodeBuilder)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! Markup is lexed in two modes (content and tag) so that `a="b"` is only an
//! attribute inside a tag. Structured objects need a single mode.
//!
//! ```text
//! "<p a=\"1\">" → [L_ANGLE, NAME, WHITESPACE, NAME, EQ, QUOTED, R_ANGLE]
//! ```
//!
//! ### 2. Parser ([`parser`] module)
//!
//! Grammar rules consume tokens and emit events. Malformed input never
//! stops the parser: it records a [`SyntaxError`] and wraps the offending
//! tokens in an `ERROR` node.
//!
//! ### 3. Sink ([`parser::sink`] module)
//!
//! Replays the events into a `GreenNodeBuilder`.
//!
//! ### 4. Typed views ([`ast`] module)
//!
//! Thin wrappers ([`ast::Element`], [`ast::Object`], ...) for walking the tree
//! without matching on raw kinds everywhere.
//!
//! ## Module Structure
//!
//! ```text
//! qti-workbench-syntax/
//! ├── lib.rs           # This file - public API and tree snapshot tests
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! ├── ast.rs           # Typed views over the CST
//! ├── lexer/
//! │   ├── markup.rs    # Two-mode markup tokenizer
//! │   └── object.rs    # Structured-object tokenizer
//! └── parser/
//!     ├── mod.rs       # Parser struct, Marker system, Parse, SyntaxError
//!     ├── event.rs     # Event enum (Start, Token, Finish, Placeholder)
//!     ├── sink.rs      # Converts events to Rowan GreenNode
//!     └── grammar/
//!         ├── markup.rs# Elements, attributes, end-tag matching
//!         └── object.rs# Objects, members, arrays, literals
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use qti_workbench_syntax::{parse, Syntax, SyntaxKind};
//!
//! let parse = parse("<p>Hello</p>", Syntax::Markup);
//! assert!(parse.is_clean());
//!
//! let tree = parse.syntax();
//! assert_eq!(tree.text().to_string(), "<p>Hello</p>");
//! assert_eq!(tree.first_child().unwrap().kind(), SyntaxKind::ELEMENT);
//!
//! let broken = qti_workbench_syntax::parse("[1, 2", Syntax::Object);
//! assert_eq!(broken.errors()[0].message, "unclosed array");
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod syntax_kind;

pub use parser::{Parse, Syntax, SyntaxError, parse};
pub use syntax_kind::{QtiLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
