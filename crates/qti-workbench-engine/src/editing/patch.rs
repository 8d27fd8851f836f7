use std::ops::Range;

use xi_rope::delta::DeltaElement;
use xi_rope::{Delta, RopeInfo};

/// Result of applying an edit to a [`Document`](super::Document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Byte ranges in the new text that differ from the old one. A pure
    /// deletion shows up as an empty range at the point of deletion.
    pub changed: Vec<Range<usize>>,
    /// Document version after the edit.
    pub version: u64,
}

/// Ranges of the delta's output that are not copied from its input.
pub(crate) fn changed_ranges(delta: &Delta<RopeInfo>) -> Vec<Range<usize>> {
    let mut changed: Vec<Range<usize>> = Vec::new();
    let mut old = 0;
    let mut new = 0;

    let mut push = |range: Range<usize>| match changed.last_mut() {
        Some(last) if last.end == range.start => last.end = range.end,
        _ => changed.push(range),
    };

    for element in &delta.els {
        match element {
            DeltaElement::Copy(from, to) => {
                if *from > old {
                    push(new..new);
                }
                new += to - from;
                old = *to;
            }
            DeltaElement::Insert(inserted) => {
                push(new..new + inserted.len());
                new += inserted.len();
            }
        }
    }
    if old < delta.base_len {
        push(new..new);
    }
    changed
}
