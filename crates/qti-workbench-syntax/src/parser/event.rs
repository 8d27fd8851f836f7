//! # Parser Events
//!
//! Events are the intermediate representation between grammar code and tree
//! building. The parser emits a **flat sequence** that the
//! [`Sink`](super::sink::Sink) replays against Rowan's builder:
//!
//! ```text
//! Start(ELEMENT)       ← open an ELEMENT node
//!   Start(START_TAG)
//!     Token(L_ANGLE)
//!     Token(NAME)
//!     Token(R_ANGLE)
//!   Finish
//!   Token(TEXT)
//!   Start(END_TAG) ... Finish
//! Finish               ← close the ELEMENT node
//! ```
//!
//! A `Start` may carry a forward parent link: "before opening me, open that
//! other node". The Sink follows the chain and opens the outermost node first.

use crate::syntax_kind::SyntaxKind;

/// An event emitted by the parser during tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a composite node, optionally wrapped by the `Start` event at
    /// index `forward_parent`.
    Start {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },

    /// Attach the next lexer token to the current node.
    Token { kind: SyntaxKind },

    /// Close the node opened by the matching `Start`.
    Finish,

    /// Reserved slot from `parser.start()`; ignored unless completed.
    Placeholder,
}

impl Event {
    /// Create a start event with no forward parent.
    pub fn start(kind: SyntaxKind) -> Self {
        Event::Start {
            kind,
            forward_parent: None,
        }
    }

    /// Create a token event.
    pub fn token(kind: SyntaxKind) -> Self {
        Event::Token { kind }
    }
}
