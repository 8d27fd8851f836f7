//! # Parser: text → model
//!
//! [`parse`] runs in three steps:
//!
//! 1. **Syntax**: the text is parsed into a lossless CST by
//!    `qti-workbench-syntax`. Syntax errors are collected, never thrown.
//! 2. **Locate**: item boundaries are found in the tree. Markup items may be
//!    bare roots or sit inside any wrapper (`assessmentTest`, sections, an
//!    unknown root); structured-object items may be a single object, a
//!    top-level array, or the `items` of a test object.
//! 3. **Read**: every located item whose byte range is free of syntax errors
//!    is turned into an [`ItemDocument`]. Items with errors are skipped, their
//!    siblings are still read.
//!
//! The located item ranges are also what the updater splices against, so
//! `InsertItem`/`ReorderItems` never need to re-walk the model.

pub(crate) mod markup;
pub(crate) mod object;
pub(crate) mod vocabulary;

#[cfg(test)]
mod tests;

use std::fmt::Display;
use std::ops::Range;
use std::str::FromStr;

use qti_workbench_syntax::SyntaxError;
use serde::Serialize;

use crate::model::diagnostics::Tally;
use crate::model::{
    Cardinality, ContentNode, Format, Interaction, ItemDocument, UnsupportedElement, Warning,
};

/// Everything [`parse`] found in a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutput {
    /// Items free of syntax errors, in document order.
    pub items: Vec<ItemDocument>,
    /// Syntax errors in source order.
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<SyntaxError>,
    /// Unsupported elements across the whole document, by first appearance.
    pub unsupported: Vec<UnsupportedElement>,
}

fn serialize_errors<S: serde::Serializer>(
    errors: &[SyntaxError],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| {
        serde_json::json!({
            "message": e.message,
            "start": e.range.start,
            "end": e.range.end,
        })
    }))
}

/// Parse raw text in the given format. Never panics on malformed input.
pub fn parse(raw: &str, format: Format) -> ParseOutput {
    let located = locate(raw, format);

    let mut unsupported = located.tally.clone();
    let mut items = Vec::new();
    for located_item in located.items {
        if let Some(item) = located_item.item {
            unsupported.merge(&item.unsupported_elements);
            items.push(item);
        }
    }

    log::debug!(
        "parsed {} item(s) from {} bytes of {format}: {} error(s)",
        items.len(),
        raw.len(),
        located.errors.len()
    );

    ParseOutput {
        items,
        errors: located.errors,
        unsupported: unsupported.into_vec(),
    }
}

/// An item boundary found in the text.
#[derive(Debug, Clone)]
pub(crate) struct LocatedItem {
    pub(crate) range: Range<usize>,
    pub(crate) id: Option<String>,
    /// `None` when a syntax error falls inside `range`.
    pub(crate) item: Option<ItemDocument>,
}

/// Where items live, which decides how a new one is spliced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Container {
    /// Nothing but whitespace.
    Empty,
    /// Markup. `slot` is where a first item goes when there are none yet: just
    /// before the innermost wrapper's end tag.
    Markup { slot: Option<usize> },
    /// A single structured-object item at the root.
    SingleObject { range: Range<usize> },
    /// Structured-object items are the values of an array; `inner` lies
    /// between its brackets.
    Array { inner: Range<usize> },
    /// A document that cannot take items (a scalar, an unknown type).
    Opaque,
}

#[derive(Debug, Clone)]
pub(crate) struct Located {
    pub(crate) items: Vec<LocatedItem>,
    pub(crate) container: Container,
    pub(crate) errors: Vec<SyntaxError>,
    /// Unsupported elements outside any item.
    pub(crate) tally: Tally,
}

pub(crate) fn locate(raw: &str, format: Format) -> Located {
    let mut located = match format {
        Format::Markup => markup::locate(raw),
        Format::StructuredObject => object::locate(raw),
    };
    located.errors.sort_by_key(|e| e.range.start);
    located
}

pub(crate) fn has_error_in(errors: &[SyntaxError], range: &Range<usize>) -> bool {
    errors.iter().any(|e| range.contains(&e.range.start))
}

/// Warnings and tallies collected while reading one item.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    pub(crate) warnings: Vec<Warning>,
    pub(crate) tally: Tally,
}

impl Diagnostics {
    /// A numeric field that falls back to `default` when it does not parse.
    pub(crate) fn number<T>(
        &mut self,
        element: &str,
        attribute: &str,
        raw: Option<&str>,
        default: T,
    ) -> T
    where
        T: FromStr + Display,
    {
        match raw {
            None => default,
            Some(raw) => match finite(raw) {
                Some(value) => value,
                None => {
                    self.warnings.push(Warning::DefaultedNumber {
                        element: element.to_string(),
                        attribute: attribute.to_string(),
                        value: raw.to_string(),
                        default: default.to_string(),
                    });
                    default
                }
            },
        }
    }

    /// An optional numeric field; an unparsable value counts as absent.
    pub(crate) fn optional_number<T: FromStr>(
        &mut self,
        element: &str,
        attribute: &str,
        raw: Option<&str>,
    ) -> Option<T> {
        let raw = raw?;
        match finite(raw) {
            Some(value) => Some(value),
            None => {
                self.warnings.push(Warning::DefaultedNumber {
                    element: element.to_string(),
                    attribute: attribute.to_string(),
                    value: raw.to_string(),
                    default: "none".to_string(),
                });
                None
            }
        }
    }

    /// A keyword field (cardinality, base type, boolean) with a default.
    pub(crate) fn keyword<T>(
        &mut self,
        element: &str,
        attribute: &str,
        raw: Option<&str>,
        default: T,
    ) -> T
    where
        T: FromStr + Display,
    {
        match raw {
            None => default,
            Some(raw) => match raw.trim().parse() {
                Ok(value) => value,
                Err(_) => {
                    self.warnings.push(Warning::DefaultedKeyword {
                        element: element.to_string(),
                        attribute: attribute.to_string(),
                        value: raw.to_string(),
                        default: default.to_string(),
                    });
                    default
                }
            },
        }
    }

    pub(crate) fn unsupported(&mut self, kind: &str, description: impl FnOnce() -> String) {
        self.tally.record(kind, description);
    }
}

/// A number that parses and is finite; `NaN` and `inf` count as unparsable.
fn finite<T: FromStr>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.parse::<f64>().is_ok_and(|v| !v.is_finite()) {
        return None;
    }
    raw.parse().ok()
}

/// Checks that need the whole item: choice vs multiple response, dangling
/// response identifiers, duplicate declarations, surplus correct values.
pub(crate) fn finish_item(item: &mut ItemDocument, mut diagnostics: Diagnostics) {
    if item.id.is_empty() {
        diagnostics.warnings.push(Warning::MissingItemIdentifier);
    }

    let mut seen: Vec<&str> = Vec::new();
    for declaration in &item.response_declarations {
        if seen.contains(&declaration.identifier.as_str()) {
            diagnostics.warnings.push(Warning::DuplicateDeclaration {
                identifier: declaration.identifier.clone(),
            });
        }
        seen.push(&declaration.identifier);

        if declaration.cardinality == Cardinality::Single && declaration.correct_response.len() > 1
        {
            diagnostics.warnings.push(Warning::TooManyCorrectValues {
                identifier: declaration.identifier.clone(),
                count: declaration.correct_response.len(),
            });
        }
    }

    let declarations: Vec<(String, Cardinality)> = item
        .response_declarations
        .iter()
        .map(|d| (d.identifier.clone(), d.cardinality))
        .collect();
    let mut body = std::mem::take(&mut item.body);
    resolve_interactions(&mut body, &declarations, &mut diagnostics.warnings);
    item.body = body;

    item.warnings = diagnostics.warnings;
    item.unsupported_elements = diagnostics.tally.into_vec();
}

fn resolve_interactions(
    nodes: &mut [ContentNode],
    declarations: &[(String, Cardinality)],
    warnings: &mut Vec<Warning>,
) {
    for node in nodes {
        match node {
            ContentNode::Interaction(interaction) => {
                if let Interaction::Choice(choice) = interaction {
                    let multiple = declarations.iter().any(|(id, c)| {
                        *id == choice.response_identifier && *c == Cardinality::Multiple
                    });
                    if multiple || choice.max_choices != 1 {
                        let choice = choice.clone();
                        *interaction = Interaction::MultipleResponse(choice);
                    }
                }

                if let Some(response_identifier) = interaction.response_identifier()
                    && !response_identifier.is_empty()
                    && !declarations.iter().any(|(id, _)| id == response_identifier)
                {
                    warnings.push(Warning::DanglingResponseIdentifier {
                        interaction: interaction.tag().to_string(),
                        response_identifier: response_identifier.to_string(),
                    });
                }

                if let Interaction::Hottext(hottext) = interaction {
                    resolve_interactions(&mut hottext.content, declarations, warnings);
                }
            }
            ContentNode::Element { children, .. } | ContentNode::Hottext { children, .. } => {
                resolve_interactions(children, declarations, warnings)
            }
            ContentNode::Text { .. } | ContentNode::Unknown(_) => {}
        }
    }
}

/// Append text, merging with a preceding text node.
pub(crate) fn push_text(nodes: &mut Vec<ContentNode>, text: String) {
    if let Some(ContentNode::Text { text: last }) = nodes.last_mut() {
        last.push_str(&text);
    } else {
        nodes.push(ContentNode::Text { text });
    }
}

/// Whitespace-only text is layout unless the element has real text too.
pub(crate) fn drop_layout_whitespace(nodes: &mut Vec<ContentNode>) {
    let mixed = nodes
        .iter()
        .any(|n| matches!(n, ContentNode::Text { text } if !text.trim().is_empty()));
    if !mixed {
        nodes.retain(|n| !matches!(n, ContentNode::Text { .. }));
    }
}

pub(crate) fn push_node(nodes: &mut Vec<ContentNode>, node: ContentNode) {
    match node {
        ContentNode::Text { text } => push_text(nodes, text),
        other => nodes.push(other),
    }
}
