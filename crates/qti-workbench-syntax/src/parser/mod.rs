//! # Parser - Event-Based Tree Construction
//!
//! This module implements the core parsing logic, transforming a token stream
//! into a syntax tree using the **event-based** architecture from rust-analyzer.
//!
//! ## Why Event-Based Parsing?
//!
//! Instead of building the tree directly, grammar functions emit a flat list
//! of **events** ([`Event`]) that describe the tree structure. The [`Sink`]
//! then builds the actual Rowan tree from events. Grammar code never touches
//! Rowan, and partially-recognised constructs never leave half-built nodes
//! behind.
//!
//! ## The Marker System
//!
//! `parser.start()` returns a [`Marker`] which **must** be either completed
//! (`marker.complete(parser, KIND)`) or abandoned (`marker.abandon(parser)`).
//! Dropping a marker without doing either panics, catching grammar bugs at
//! test time rather than producing corrupt trees.
//!
//! ```ignore
//! let m = parser.start();
//! parser.bump();
//! m.complete(parser, SyntaxKind::ELEMENT);
//! ```
//!
//! ## Errors
//!
//! Grammar functions never fail. When input is malformed they record a
//! [`SyntaxError`] with the byte range of the offending token and keep going,
//! usually by wrapping the token in an `ERROR` node. The resulting [`Parse`]
//! always holds a tree whose text equals the input.
//!
//! ## Public API
//!
//! ```
//! use qti_workbench_syntax::{parse, Syntax, SyntaxKind};
//!
//! let parse = parse("<p>Hello</p>", Syntax::Markup);
//! assert!(parse.errors().is_empty());
//! assert_eq!(parse.syntax().kind(), SyntaxKind::ROOT);
//! ```

pub mod event;
pub mod sink;

mod grammar;

use std::fmt;
use std::ops::Range;

use rowan::GreenNode;

use crate::lexer::{Token, lex_markup, lex_object};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use event::Event;
use sink::Sink;

/// Which surface syntax to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// Element/attribute markup.
    Markup,
    /// Nested key/value objects.
    Object,
}

/// A syntax-level failure with the byte range it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: Range<usize>,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.range.start, self.range.end)
    }
}

impl std::error::Error for SyntaxError {}

/// The result of parsing: a lossless tree plus the syntax errors met on the way.
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<SyntaxError>,
}

impl Parse {
    /// The root node of the tree.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Syntax errors in source order.
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// True when no syntax errors were recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The parser state machine.
///
/// Holds the token stream, current position, and accumulated events.
/// Grammar functions receive `&mut Parser` and use its methods to:
///
/// - Inspect tokens: `current()`, `nth()`, `at()`, `at_end()`
/// - Consume tokens: `bump()`, `eat()`
/// - Build structure: `start()` → `Marker` → `complete()`/`abandon()`
/// - Report problems: `error()`, `error_at()`
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    offsets: Vec<usize>,
    pos: usize,
    events: Vec<Event>,
    errors: Vec<SyntaxError>,
}

impl<'t, 'input> Parser<'t, 'input> {
    /// Create a new parser from a slice of tokens.
    pub fn new(tokens: &'t [Token<'input>]) -> Self {
        let mut offsets = Vec::with_capacity(tokens.len() + 1);
        let mut offset = 0;
        offsets.push(0);
        for token in tokens {
            offset += token.text.len();
            offsets.push(offset);
        }

        Self {
            tokens,
            offsets,
            pos: 0,
            events: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Parse the tokens with the grammar for `syntax`.
    pub fn parse(mut self, syntax: Syntax) -> Parse {
        match syntax {
            Syntax::Markup => grammar::markup::document(&mut self),
            Syntax::Object => grammar::object::document(&mut self),
        }
        let mut errors = self.errors;
        errors.sort_by_key(|e| e.range.start);
        let sink = Sink::new(self.tokens, self.events);
        Parse {
            green: sink.finish(),
            errors,
        }
    }

    /// Start a new node and return a marker.
    pub fn start(&mut self) -> Marker {
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Look ahead n tokens.
    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    /// Text of the token n ahead, or "" past the end.
    pub fn nth_text(&self, n: usize) -> &'input str {
        self.tokens.get(self.pos + n).map(|t| t.text).unwrap_or("")
    }

    /// Check if at end of input.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Check if current token is of given kind.
    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) {
        if !self.at_end() {
            let kind = self.current();
            self.events.push(Event::token(kind));
            self.pos += 1;
        }
    }

    /// Get the text of the current token.
    pub fn current_text(&self) -> &'input str {
        self.nth_text(0)
    }

    /// Byte range of the current token (empty at end of input).
    pub fn current_range(&self) -> Range<usize> {
        let start = self.offsets[self.pos.min(self.tokens.len())];
        let end = self.offsets[(self.pos + 1).min(self.tokens.len())];
        start..end
    }

    /// Record an error at the current token.
    pub fn error(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        self.error_at(range, message);
    }

    /// Record an error at an explicit byte range.
    pub fn error_at(&mut self, range: Range<usize>, message: impl Into<String>) {
        self.errors.push(SyntaxError {
            message: message.into(),
            range,
        });
    }

    /// Remaining tokens count.
    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.pos)
    }
}

/// A marker for a node being constructed.
///
/// When you call `parser.start()`, a `Placeholder` event is pushed and you
/// get a `Marker` pointing to it. Every marker must be completed or
/// abandoned; dropping one otherwise panics.
#[must_use = "Markers must be completed or abandoned, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    /// Tracks whether complete() or abandon() was called
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a node of the given kind.
    pub fn complete(mut self, p: &mut Parser<'_, '_>, kind: SyntaxKind) -> CompletedMarker {
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::Start {
            kind,
            forward_parent: None,
        };
        p.events.push(Event::Finish);
        CompletedMarker { pos: self.pos }
    }

    /// Abandon this marker without creating a node.
    ///
    /// Only removes the placeholder if it's the last event; otherwise the
    /// placeholder becomes inert and is ignored by the Sink.
    pub fn abandon(mut self, p: &mut Parser<'_, '_>) {
        self.completed = true;
        if self.pos == p.events.len() - 1 {
            match p.events.pop() {
                Some(Event::Placeholder) => {}
                _ => unreachable!(),
            }
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be either completed or abandoned");
        }
    }
}

/// A marker for a node that has been completed.
///
/// `precede()` wraps the completed node in a new parent, resolved by the
/// Sink through a forward parent link.
#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    /// Position of the Start event for this completed node
    pos: usize,
}

impl CompletedMarker {
    /// Create a new parent node that will contain this node.
    pub fn precede(self, p: &mut Parser<'_, '_>) -> Marker {
        let new_pos = p.events.len();
        p.events.push(Event::Placeholder);

        if let Event::Start { forward_parent, .. } = &mut p.events[self.pos] {
            *forward_parent = Some(new_pos);
        }

        Marker {
            pos: new_pos,
            completed: false,
        }
    }
}

/// Parse source text in the given surface syntax.
pub fn parse(source: &str, syntax: Syntax) -> Parse {
    let tokens = match syntax {
        Syntax::Markup => lex_markup(source),
        Syntax::Object => lex_object(source),
    };
    Parser::new(&tokens).parse(syntax)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_empty_input() {
        for syntax in [Syntax::Markup, Syntax::Object] {
            let parse = parse("", syntax);
            assert_eq!(parse.syntax().kind(), SyntaxKind::ROOT);
            assert_eq!(parse.syntax().children().count(), 0);
            assert!(parse.is_clean());
        }
    }

    #[test]
    fn parse_preserves_all_text() {
        let input = "<p>Hello, world!</p>";
        let parse = parse(input, Syntax::Markup);
        assert_eq!(parse.syntax().text(), input);
    }

    #[test]
    fn current_range_tracks_offsets() {
        let tokens = lex_markup("<p>x</p>");
        let mut parser = Parser::new(&tokens);
        assert_eq!(parser.current_range(), 0..1);
        let m = parser.start();
        parser.bump();
        assert_eq!(parser.current_range(), 1..2);
        while !parser.at_end() {
            parser.bump();
        }
        assert_eq!(parser.current_range(), 8..8);
        m.complete(&mut parser, SyntaxKind::ROOT);
    }

    #[test]
    fn errors_are_sorted_by_position() {
        let parse = parse("</x><p><q></p>", Syntax::Markup);
        let starts: Vec<_> = parse.errors().iter().map(|e| e.range.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        assert!(!parse.is_clean());
    }

    #[test]
    fn marker_must_be_completed() {
        let result = std::panic::catch_unwind(|| {
            let tokens = lex_markup("test");
            let mut parser = Parser::new(&tokens);
            let _marker = parser.start();
            // Marker dropped without completion - should panic
        });
        assert!(result.is_err());
    }

    #[test]
    fn marker_can_be_abandoned() {
        let tokens = lex_markup("test");
        let mut parser = Parser::new(&tokens);
        let marker = parser.start();
        marker.abandon(&mut parser);
        // Should not panic
    }
}
