//! # Serializer: model → text
//!
//! [`serialize`] regenerates a whole document from items. It is used for
//! format conversion, template generation and whenever no targeted splice
//! exists; everyday edits go through [`crate::editing`] instead so that
//! formatting and comments outside the edited span survive.
//!
//! Output is canonical rather than faithful: attributes in a fixed order,
//! two-space indentation, default values spelled out. Unknown fragments are
//! written back verbatim when the target format is the one they were read
//! from, and as plain text otherwise.
//!
//! Re-parsing the output yields the same items (minus warnings whose cause
//! the canonical form no longer contains).

mod markup;
mod object;

use crate::model::{Format, ItemDocument};

/// Write `items` as one document in `format`.
///
/// Several markup items are wrapped in a test element; several
/// structured-object items become a top-level array.
pub fn serialize(items: &[ItemDocument], format: Format) -> String {
    log::debug!("serializing {} item(s) as {format}", items.len());
    match format {
        Format::Markup => markup::write(items),
        Format::StructuredObject => object::write(items),
    }
}
