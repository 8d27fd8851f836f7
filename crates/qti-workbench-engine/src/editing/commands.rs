//! Edit operations.
//!
//! Every [`Edit`] compiles to a handful of text splices against the located
//! item boundaries, and the splices to one `xi_rope` delta. The model is
//! only consulted for validation; nothing is regenerated from it, so
//! comments, whitespace and unknown fragments outside the spliced spans are
//! untouched.

use std::ops::Range;

use qti_workbench_syntax::ast::{Element, Member, Object, Value, byte_range};
use qti_workbench_syntax::{Syntax, SyntaxNode};
use thiserror::Error;
use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use super::patch::changed_ranges;
use crate::model::{BaseType, Cardinality, Format, ResponseDeclaration};
use crate::parsing::markup::decode;
use crate::parsing::object::string;
use crate::parsing::vocabulary::{
    CORRECT_RESPONSE, RESPONSE_DECLARATION, VALUE, canonical_name, element_name, version_of,
};
use crate::parsing::{Container, Located, locate};

const INDENT: &str = "  ";

/// A structured change to a document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace the correct response of one declaration. `response_id`
    /// defaults to the item's primary declaration; no values removes the
    /// correct response.
    SetCorrectResponse {
        item_id: String,
        response_id: Option<String>,
        values: Vec<String>,
    },
    /// Insert a single-item fragment so that it becomes item number `at`.
    InsertItem { fragment: String, at: usize },
    /// `order[i]` is the current index of the item that moves to position `i`.
    ReorderItems { order: Vec<usize> },
    ReplaceWhole { text: String },
}

/// Outcome of [`apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub text: String,
    /// Ranges of `text` that were written by the edit.
    pub changed: Vec<Range<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no item with identifier `{0}`")]
    UnknownItem(String),

    #[error("item `{item}` has no response declaration `{response}`")]
    UnknownDeclaration { item: String, response: String },

    #[error("item `{0}` has syntax errors and cannot be edited structurally")]
    ItemNotModeled(String),

    #[error("`{response}` takes a single value but {count} were given")]
    Cardinality { response: String, count: usize },

    #[error("`{value}` is not a valid {base_type} value")]
    InvalidValue { value: String, base_type: BaseType },

    #[error("invalid item fragment: {0}")]
    InvalidFragment(String),

    #[error("invalid item order: {0}")]
    InvalidOrder(String),

    #[error("cannot insert at position {index} of {len} item(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("the document has no place to put items")]
    NotAContainer,

    #[error("cannot switch a non-empty {from} document to {to}")]
    FormatLocked { from: Format, to: Format },

    #[error("the edit would introduce {0} syntax error(s)")]
    WouldIntroduceErrors(usize),
}

/// Apply `edit` to `raw`. On error the text is left as it was.
pub fn apply(raw: &str, format: Format, edit: &Edit) -> Result<Applied, EditError> {
    let (delta, text) = compile(&Rope::from(raw), format, edit)?;
    Ok(Applied {
        text: text.to_string(),
        changed: changed_ranges(&delta),
    })
}

/// Build the delta for `edit` and the text it produces, checking that the
/// result has no more syntax errors than `buffer`.
pub(crate) fn compile(
    buffer: &Rope,
    format: Format,
    edit: &Edit,
) -> Result<(Delta<RopeInfo>, Rope), EditError> {
    let raw = buffer.to_string();
    let located = locate(&raw, format);

    let result = match edit {
        Edit::SetCorrectResponse {
            item_id,
            response_id,
            values,
        } => set_correct_response(&raw, format, &located, item_id, response_id.as_deref(), values),
        Edit::InsertItem { fragment, at } => insert_item(&raw, format, &located, fragment, *at),
        Edit::ReorderItems { order } => reorder_items(&raw, &located, order),
        Edit::ReplaceWhole { text } => Ok(vec![Splice::new(0..raw.len(), text.clone())]),
    };
    let mut splices = match result {
        Ok(splices) => splices,
        Err(err) => {
            log::warn!("rejected edit: {err}");
            return Err(err);
        }
    };
    splices.sort_by_key(|s| s.range.start);

    let mut builder = Builder::new(buffer.len());
    let count = splices.len();
    for splice in splices {
        builder.replace(splice.range, Rope::from(splice.text));
    }
    let delta = builder.build();
    let text = delta.apply(buffer);

    let before = located.errors.len();
    let after = locate(&text.to_string(), format).errors.len();
    if after > before {
        let err = EditError::WouldIntroduceErrors(after - before);
        log::warn!("rejected edit: {err}");
        return Err(err);
    }

    log::debug!(
        "applied {count} splice(s) to {} bytes of {format}",
        buffer.len()
    );
    Ok((delta, text))
}

struct Splice {
    range: Range<usize>,
    text: String,
}

impl Splice {
    fn new(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at..at, text)
    }
}

/// Leading whitespace of the line holding `pos`.
fn indent_at(raw: &str, pos: usize) -> &str {
    let line_start = raw[..pos].rfind('\n').map_or(0, |i| i + 1);
    let line = &raw[line_start..];
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Where a removal starting at `pos` should begin so that a line left blank
/// goes with it.
fn removal_start(raw: &str, pos: usize) -> usize {
    match raw[..pos].rfind('\n') {
        Some(newline) if raw[newline..pos].trim().is_empty() => newline,
        _ => pos,
    }
}

// SetCorrectResponse

fn set_correct_response(
    raw: &str,
    format: Format,
    located: &Located,
    item_id: &str,
    response_id: Option<&str>,
    values: &[String],
) -> Result<Vec<Splice>, EditError> {
    let target = located
        .items
        .iter()
        .find(|item| item.id.as_deref() == Some(item_id))
        .ok_or_else(|| EditError::UnknownItem(item_id.to_string()))?;
    let item = target
        .item
        .as_ref()
        .ok_or_else(|| EditError::ItemNotModeled(item_id.to_string()))?;

    let unknown = || EditError::UnknownDeclaration {
        item: item_id.to_string(),
        response: response_id.unwrap_or("RESPONSE").to_string(),
    };
    let declaration = match response_id {
        Some(id) => item.declaration(id),
        None => item.primary_declaration(),
    }
    .ok_or_else(unknown)?;

    validate(declaration, values)?;

    let splice = match format {
        Format::Markup => markup_correct_response(raw, &target.range, declaration, values),
        Format::StructuredObject => {
            object_correct_response(raw, &target.range, declaration, values)
        }
    }
    .ok_or_else(unknown)?;
    Ok(splice.into_iter().collect())
}

fn validate(declaration: &ResponseDeclaration, values: &[String]) -> Result<(), EditError> {
    if declaration.cardinality == Cardinality::Single && values.len() > 1 {
        return Err(EditError::Cardinality {
            response: declaration.identifier.clone(),
            count: values.len(),
        });
    }
    if let Some(value) = values
        .iter()
        .find(|value| !declaration.base_type.accepts(value))
    {
        return Err(EditError::InvalidValue {
            value: value.clone(),
            base_type: declaration.base_type,
        });
    }
    Ok(())
}

/// `Some(None)` is a no-op; `None` means the declaration was not found in
/// the tree.
fn markup_correct_response(
    raw: &str,
    item_range: &Range<usize>,
    declaration: &ResponseDeclaration,
    values: &[String],
) -> Option<Option<Splice>> {
    let parse = qti_workbench_syntax::parse(raw, Syntax::Markup);
    let root = parse.syntax();
    let item = root
        .descendants()
        .filter_map(Element::cast)
        .find(|e| e.range() == *item_range)?;
    let version = version_of(&item.name()?);
    let is = |element: &Element, canonical: &str| {
        element
            .name()
            .and_then(|name| canonical_name(&name, version))
            .as_deref()
            == Some(canonical)
    };

    let declaration_element = item.child_elements().find(|e| {
        is(e, RESPONSE_DECLARATION)
            && e.attribute("identifier")
                .map(|raw| decode(&raw).into_owned())
                .unwrap_or_default()
                == declaration.identifier
    })?;
    let value_tag = element_name(VALUE, version);
    let value_lines = |indent: &str| -> String {
        values
            .iter()
            .map(|value| {
                format!(
                    "\n{indent}<{value_tag}>{}</{value_tag}>",
                    html_escape::encode_text(value)
                )
            })
            .collect()
    };

    let existing = declaration_element
        .child_elements()
        .find(|e| is(e, CORRECT_RESPONSE));

    if let Some(correct) = existing {
        let range = correct.range();
        if values.is_empty() {
            return Some(Some(Splice::new(removal_start(raw, range.start)..range.end, "")));
        }
        let indent = indent_at(raw, range.start);
        let inner = value_lines(&format!("{indent}{INDENT}"));
        return Some(Some(match correct.inner_range() {
            Some(span) => Splice::new(span, format!("{inner}\n{indent}")),
            None => {
                let name = correct.name()?;
                let open = open_tag(&correct)?;
                Splice::new(range, format!("{open}{inner}\n{indent}</{name}>"))
            }
        }));
    }

    if values.is_empty() {
        return Some(None);
    }

    let range = declaration_element.range();
    let indent = indent_at(raw, range.start);
    let child_indent = format!("{indent}{INDENT}");
    let correct_tag = element_name(CORRECT_RESPONSE, version);
    let block = format!(
        "\n{child_indent}<{correct_tag}>{}\n{child_indent}</{correct_tag}>",
        value_lines(&format!("{child_indent}{INDENT}"))
    );

    Some(Some(match declaration_element.inner_range() {
        Some(span) => Splice::insert(span.start, block),
        None if declaration_element.is_self_closing() => {
            let name = declaration_element.name()?;
            let open = open_tag(&declaration_element)?;
            Splice::new(range, format!("{open}{block}\n{indent}</{name}>"))
        }
        None => return None,
    }))
}

/// The start tag of a self-closing element, rewritten to open it.
fn open_tag(element: &Element) -> Option<String> {
    let start_tag = element.start_tag()?.text().to_string();
    let open = start_tag.strip_suffix("/>")?.trim_end();
    Some(format!("{open}>"))
}

fn object_correct_response(
    raw: &str,
    item_range: &Range<usize>,
    declaration: &ResponseDeclaration,
    values: &[String],
) -> Option<Option<Splice>> {
    let parse = qti_workbench_syntax::parse(raw, Syntax::Object);
    let root = parse.syntax();
    let item = find_object(&root, item_range)?;
    let declaration_object = item
        .get("responseDeclarations")?
        .as_array()?
        .values()
        .filter_map(|value| value.as_object().cloned())
        .find(|object| {
            object
                .get("identifier")
                .as_ref()
                .and_then(string)
                .unwrap_or_default()
                == declaration.identifier
        })?;

    let members: Vec<Member> = declaration_object.members().collect();
    let position = members
        .iter()
        .position(|m| m.raw_key().as_deref() == Some("correctResponse"));

    match position {
        Some(index) => {
            let span = member_span(&members[index]);
            if values.is_empty() {
                let range = if index > 0 {
                    member_span(&members[index - 1]).end..span.end
                } else if let Some(next) = members.get(index + 1) {
                    span.start..member_span(next).start
                } else {
                    span
                };
                return Some(Some(Splice::new(range, "")));
            }
            let value = members[index].value()?;
            Some(Some(Splice::new(value.range(), json_array(values))))
        }
        None if values.is_empty() => Some(None),
        None => match members.last() {
            Some(last) => {
                let span = member_span(last);
                let indent = indent_at(raw, span.start);
                Some(Some(Splice::insert(
                    span.end,
                    format!(",\n{indent}\"correctResponse\": {}", json_array(values)),
                )))
            }
            None => {
                let open = byte_range(declaration_object.syntax().text_range()).start + 1;
                Some(Some(Splice::insert(
                    open,
                    format!("\"correctResponse\": {}", json_array(values)),
                )))
            }
        },
    }
}

fn find_object(root: &SyntaxNode, range: &Range<usize>) -> Option<Object> {
    root.descendants()
        .filter_map(Value::cast)
        .find_map(|value| match value {
            Value::Object(object) if byte_range(object.syntax().text_range()) == *range => {
                Some(object)
            }
            _ => None,
        })
}

/// From the key's opening quote to the end of the value.
fn member_span(member: &Member) -> Range<usize> {
    let range = member.range();
    let start = member
        .key_token()
        .map_or(range.start, |key| byte_range(key.text_range()).start);
    let end = member.value().map_or(range.end, |value| value.range().end);
    start..end
}

fn json_array(values: &[String]) -> String {
    let values: Vec<String> = values
        .iter()
        .map(|value| serde_json::Value::from(value.as_str()).to_string())
        .collect();
    format!("[{}]", values.join(", "))
}

// InsertItem

fn insert_item(
    raw: &str,
    format: Format,
    located: &Located,
    fragment: &str,
    at: usize,
) -> Result<Vec<Splice>, EditError> {
    let item = item_fragment(fragment, format)?;
    let items = &located.items;
    if at > items.len() {
        return Err(EditError::IndexOutOfRange {
            index: at,
            len: items.len(),
        });
    }
    let separator = match format {
        Format::Markup => "",
        Format::StructuredObject => ",",
    };

    let splices = match &located.container {
        Container::Opaque => return Err(EditError::NotAContainer),
        Container::Empty if raw.trim().is_empty() => {
            vec![Splice::new(0..raw.len(), format!("{item}\n"))]
        }
        Container::Empty => {
            let lead = if raw.ends_with('\n') { "" } else { "\n" };
            vec![Splice::insert(raw.len(), format!("{lead}{item}\n"))]
        }
        Container::SingleObject { range } if at == 0 => vec![
            Splice::insert(range.start, format!("[\n{item},\n")),
            Splice::insert(range.end, "\n]"),
        ],
        Container::SingleObject { range } => vec![
            Splice::insert(range.start, "[\n"),
            Splice::insert(range.end, format!(",\n{item}\n]")),
        ],
        Container::Markup { .. } | Container::Array { .. } if !items.is_empty() => {
            match items.get(at) {
                Some(next) => {
                    let indent = indent_at(raw, next.range.start);
                    vec![Splice::insert(
                        next.range.start,
                        format!("{item}{separator}\n{indent}"),
                    )]
                }
                None => {
                    let last = &items[items.len() - 1];
                    let indent = indent_at(raw, last.range.start);
                    vec![Splice::insert(
                        last.range.end,
                        format!("{separator}\n{indent}{item}"),
                    )]
                }
            }
        }
        Container::Markup { slot: Some(slot) } => {
            let indent = indent_at(raw, *slot);
            let line_start = slot - indent.len();
            if raw[..line_start].ends_with('\n') || line_start == 0 {
                vec![Splice::insert(*slot, format!("{INDENT}{item}\n{indent}"))]
            } else {
                vec![Splice::insert(
                    *slot,
                    format!("\n{indent}{INDENT}{item}\n{indent}"),
                )]
            }
        }
        Container::Markup { slot: None } => return Err(EditError::NotAContainer),
        Container::Array { inner } => {
            let indent = indent_at(raw, inner.start.saturating_sub(1));
            vec![Splice::new(
                inner.clone(),
                format!("\n{indent}{INDENT}{item}\n{indent}"),
            )]
        }
    };
    Ok(splices)
}

/// The text of the one item in `fragment`, without any declaration or
/// wrapper around it.
fn item_fragment(fragment: &str, format: Format) -> Result<String, EditError> {
    let located = locate(fragment, format);
    if let Some(first) = located.errors.first() {
        return Err(EditError::InvalidFragment(format!(
            "{} syntax error(s), first: {} at {}..{}",
            located.errors.len(),
            first.message,
            first.range.start,
            first.range.end
        )));
    }
    match located.items.as_slice() {
        [one] if one.item.is_some() => Ok(fragment[one.range.clone()].to_string()),
        items => Err(EditError::InvalidFragment(format!(
            "expected exactly one item, found {}",
            items.len()
        ))),
    }
}

// ReorderItems

fn reorder_items(raw: &str, located: &Located, order: &[usize]) -> Result<Vec<Splice>, EditError> {
    let items = &located.items;
    if order.len() != items.len() {
        return Err(EditError::InvalidOrder(format!(
            "expected {} position(s), got {}",
            items.len(),
            order.len()
        )));
    }
    let mut seen = vec![false; items.len()];
    for &index in order {
        if index >= items.len() {
            return Err(EditError::InvalidOrder(format!("{index} is out of range")));
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(EditError::InvalidOrder(format!("{index} appears twice")));
        }
    }

    Ok(order
        .iter()
        .enumerate()
        .filter(|&(position, &from)| position != from)
        .map(|(position, &from)| {
            Splice::new(
                items[position].range.clone(),
                &raw[items[from].range.clone()],
            )
        })
        .collect())
}

#[cfg(test)]
mod tests;
