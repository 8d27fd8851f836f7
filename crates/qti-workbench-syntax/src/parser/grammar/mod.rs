//! # Grammar Rules
//!
//! Each grammar function takes a `&mut Parser` and uses its methods to:
//!
//! 1. Inspect the current token (`p.current()`, `p.at()`, `p.nth()`)
//! 2. Consume tokens (`p.bump()`, `p.eat()`)
//! 3. Build tree structure (`p.start()` → marker → `complete()`/`abandon()`)
//! 4. Record problems (`p.error()`, `p.error_at()`)
//!
//! ## Module Structure
//!
//! - [`markup`] - elements, attributes, end-tag matching
//! - [`object`] - objects, members, arrays, literals
//!
//! ## Error Recovery
//!
//! Grammar functions never give up. When something unexpected happens they
//! record a [`SyntaxError`](crate::SyntaxError), wrap the offending token in
//! an `ERROR` node and move on. Every loop consumes at least one token per
//! iteration, so malformed input still terminates with a tree that preserves
//! all input bytes.

pub(crate) mod markup;
pub(crate) mod object;

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Nesting limit shared by both grammars.
pub(crate) const MAX_DEPTH: usize = 256;

/// Wrap the current token in an ERROR node and record `message` against it.
pub(crate) fn recover(p: &mut Parser<'_, '_>, message: impl Into<String>) {
    let m = p.start();
    p.error(message);
    p.bump();
    m.complete(p, SyntaxKind::ERROR);
}
