//! Structured-object CST → model.
//!
//! Field names follow the camelCase vocabulary (`responseIdentifier`,
//! `maxChoices`). Structured-object documents are always read as 3.0.

use qti_workbench_syntax::ast::{Array, Object, Value, byte_range, root_value};
use qti_workbench_syntax::{Syntax, SyntaxError, SyntaxKind};

use super::vocabulary::{
    CHOICE, EXTENDED_TEXT, HOTTEXT, HOTTEXT_INTERACTION, ITEM, ORDER, SLIDER, TEST, TEXT_ENTRY,
    is_xhtml, looks_like_interaction,
};
use super::{Container, Diagnostics, Located, LocatedItem, finish_item, has_error_in};
use crate::model::diagnostics::Tally;
use crate::model::{
    BaseType, Cardinality, ChoiceInteraction, ContentNode, ExtendedTextInteraction, Format,
    HottextInteraction, Interaction, ItemDocument, MapEntry, Mapping, OrderInteraction,
    OutcomeDeclaration, ResponseDeclaration, ResponseProcessing, SimpleChoice, SliderInteraction,
    SpecVersion, TextEntryInteraction, UnknownNode, Warning,
};

/// Item members with a place in the model.
const ITEM_KEYS: &[&str] = &[
    "type",
    "identifier",
    "title",
    "responseDeclarations",
    "outcomeDeclarations",
    "itemBody",
    "responseProcessing",
];

const DECLARATION_KEYS: &[&str] = &[
    "identifier",
    "cardinality",
    "baseType",
    "correctResponse",
    "mapping",
];
const MAPPING_KEYS: &[&str] = &["defaultValue", "lowerBound", "upperBound", "entries"];
const ENTRY_KEYS: &[&str] = &["key", "value", "caseSensitive"];
const OUTCOME_KEYS: &[&str] = &[
    "identifier",
    "cardinality",
    "baseType",
    "defaultValue",
    "normalMaximum",
];
const ELEMENT_KEYS: &[&str] = &["type", "attributes", "children"];
const HOTTEXT_KEYS: &[&str] = &["type", "identifier", "children"];
const SIMPLE_CHOICE_KEYS: &[&str] = &["identifier", "fixed", "content"];

/// Members of each interaction object, `type` and `responseIdentifier` aside.
fn interaction_keys(tag: &str) -> &'static [&'static str] {
    match tag {
        CHOICE | ORDER => &["shuffle", "maxChoices", "minChoices", "prompt", "choices"],
        TEXT_ENTRY => &["expectedLength", "patternMask", "placeholderText"],
        EXTENDED_TEXT => &["expectedLines", "expectedLength", "prompt"],
        HOTTEXT_INTERACTION => &["maxChoices", "prompt", "content"],
        SLIDER => &["lowerBound", "upperBound", "step", "stepLabel", "reverse", "prompt"],
        _ => &[],
    }
}

pub(super) fn locate(source: &str) -> Located {
    let parse = qti_workbench_syntax::parse(source, Syntax::Object);
    let root = parse.syntax();
    let mut errors = parse.errors().to_vec();
    let mut tally = Tally::default();
    let mut items = Vec::new();

    let container = match root_value(&root) {
        None => {
            if errors.is_empty() {
                Container::Empty
            } else {
                Container::Opaque
            }
        }
        Some(Value::Array(array)) => {
            collect_items(&array, &mut errors, &mut items);
            Container::Array {
                inner: inner_range(&array),
            }
        }
        Some(Value::Object(object)) => {
            let kind = object.get("type").as_ref().and_then(string);
            let is_test = match kind.as_deref() {
                Some(TEST) => true,
                None => object.member("items").is_some() && object.member("itemBody").is_none(),
                _ => false,
            };
            if is_test {
                for member in object.members() {
                    let key = member.raw_key().unwrap_or_default();
                    if !matches!(key.as_str(), "type" | "identifier" | "title" | "items") {
                        tally.record(&key, || {
                            format!("test field `{key}` is not an item or item container; ignored")
                        });
                    }
                }
                match object.get("items") {
                    Some(Value::Array(array)) => {
                        collect_items(&array, &mut errors, &mut items);
                        Container::Array {
                            inner: inner_range(&array),
                        }
                    }
                    Some(other) => {
                        errors.push(SyntaxError {
                            message: "`items` must be an array".to_string(),
                            range: other.range(),
                        });
                        Container::Opaque
                    }
                    None => Container::Opaque,
                }
            } else if kind.is_none() || kind.as_deref() == Some(ITEM) {
                let range = byte_range(object.syntax().text_range());
                items.push(located_item(&object, range.clone(), &errors));
                Container::SingleObject { range }
            } else {
                let kind = kind.unwrap_or_default();
                tally.record(&kind, || {
                    format!("document type `{kind}` is not an item or item container; ignored")
                });
                Container::Opaque
            }
        }
        Some(literal @ Value::Literal(_)) => {
            errors.push(SyntaxError {
                message: "expected an item object or an array of items".to_string(),
                range: literal.range(),
            });
            Container::Opaque
        }
    };

    Located {
        items,
        container,
        errors,
        tally,
    }
}

fn collect_items(
    array: &Array,
    errors: &mut Vec<SyntaxError>,
    items: &mut Vec<LocatedItem>,
) {
    for value in array.values() {
        match &value {
            Value::Object(object) => {
                items.push(located_item(object, value.range(), errors));
            }
            other => {
                let range = other.range();
                errors.push(SyntaxError {
                    message: "item must be an object".to_string(),
                    range: range.clone(),
                });
                items.push(LocatedItem {
                    range,
                    id: None,
                    item: None,
                });
            }
        }
    }
}

fn located_item(
    object: &Object,
    range: std::ops::Range<usize>,
    errors: &[SyntaxError],
) -> LocatedItem {
    let id = object.get("identifier").as_ref().and_then(string);
    let item = (!has_error_in(errors, &range)).then(|| ItemReader::read(object));
    LocatedItem { range, id, item }
}

/// Byte range between an array's brackets.
fn inner_range(array: &Array) -> std::ops::Range<usize> {
    let range = byte_range(array.syntax().text_range());
    let closed = array
        .syntax()
        .last_token()
        .is_some_and(|t| t.kind() == SyntaxKind::R_BRACKET);
    let end = if closed { range.end - 1 } else { range.end };
    (range.start + 1).min(end)..end
}

/// Decoded string literal.
pub(crate) fn string(value: &Value) -> Option<String> {
    let Value::Literal(literal) = value else {
        return None;
    };
    let token = literal.token()?;
    if token.kind() != SyntaxKind::STRING {
        return None;
    }
    serde_json::from_str(token.text()).ok()
}

/// A scalar as text: decoded strings, numbers and booleans as written.
fn scalar(value: &Value) -> Option<String> {
    let Value::Literal(literal) = value else {
        return None;
    };
    match literal.kind() {
        SyntaxKind::STRING => string(value),
        SyntaxKind::NUMBER | SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW => {
            literal.token().map(|t| t.text().to_string())
        }
        _ => None,
    }
}

struct ItemReader {
    diagnostics: Diagnostics,
}

impl ItemReader {
    fn read(object: &Object) -> ItemDocument {
        let mut reader = ItemReader {
            diagnostics: Diagnostics::default(),
        };
        let mut item = ItemDocument::new(
            reader.text(object, "identifier").unwrap_or_default(),
            Format::StructuredObject,
            SpecVersion::V3_0,
        );
        item.title = reader.text(object, "title");

        if let Some(Value::Array(declarations)) = object.get("responseDeclarations") {
            for value in declarations.values() {
                match value.as_object() {
                    Some(declaration) => {
                        let declaration = reader.response_declaration(declaration);
                        item.response_declarations.push(declaration);
                    }
                    None => reader.ignore("responseDeclaration", "responseDeclarations"),
                }
            }
        }

        if let Some(Value::Array(outcomes)) = object.get("outcomeDeclarations") {
            for value in outcomes.values() {
                match value.as_object() {
                    Some(outcome) => {
                        let outcome = reader.outcome_declaration(outcome);
                        item.outcome_declarations.push(outcome);
                    }
                    None => reader.ignore("outcomeDeclaration", "outcomeDeclarations"),
                }
            }
        }

        if let Some(body) = object.get("itemBody") {
            item.body = reader.content(&body);
        }

        item.response_processing = match object.get("responseProcessing") {
            None => ResponseProcessing::Absent,
            Some(value) => match (&value, string(&value)) {
                (_, Some(uri)) => ResponseProcessing::template(uri),
                (Value::Object(rp), None) => match rp.get("template").as_ref().and_then(string) {
                    Some(uri) => ResponseProcessing::template(uri),
                    None => ResponseProcessing::Custom { raw: value.text() },
                },
                _ => ResponseProcessing::Custom { raw: value.text() },
            },
        };

        item.unknown_sections = reader.extra(object, "item", ITEM_KEYS);

        finish_item(&mut item, reader.diagnostics);
        item
    }

    fn text(&self, object: &Object, key: &str) -> Option<String> {
        object.get(key).as_ref().and_then(scalar)
    }

    fn number<T>(&mut self, object: &Object, tag: &str, key: &str, default: T) -> T
    where
        T: std::str::FromStr + std::fmt::Display,
    {
        let raw = self.text(object, key);
        self.diagnostics.number(tag, key, raw.as_deref(), default)
    }

    fn optional_number<T: std::str::FromStr>(
        &mut self,
        object: &Object,
        tag: &str,
        key: &str,
    ) -> Option<T> {
        let raw = self.text(object, key);
        self.diagnostics.optional_number(tag, key, raw.as_deref())
    }

    fn flag(&mut self, object: &Object, tag: &str, key: &str, default: bool) -> bool {
        let raw = self.text(object, key);
        self.diagnostics.keyword(tag, key, raw.as_deref(), default)
    }

    /// Members outside `known`, tallied and kept for regeneration.
    fn extra(&mut self, object: &Object, parent: &str, known: &[&str]) -> Vec<UnknownNode> {
        let mut extra = Vec::new();
        for member in object.members() {
            let key = member.raw_key().unwrap_or_default();
            if known.contains(&key.as_str()) {
                continue;
            }
            self.diagnostics.unsupported(&key, || {
                format!("`{key}` in `{parent}` is not modeled; kept verbatim")
            });
            extra.push(UnknownNode {
                raw: member.value().map(|v| v.text()).unwrap_or_default(),
                tag: key,
            });
        }
        extra
    }

    fn ignore(&mut self, kind: &str, parent: &str) {
        self.diagnostics.unsupported(kind, || {
            format!("`{kind}` in `{parent}` is not modeled and is dropped on regeneration")
        });
    }

    fn response_identifier(&mut self, object: &Object, tag: &str) -> String {
        self.text(object, "responseIdentifier").unwrap_or_else(|| {
            self.diagnostics
                .warnings
                .push(Warning::MissingResponseIdentifier {
                    interaction: tag.to_string(),
                });
            String::new()
        })
    }

    fn response_declaration(&mut self, object: &Object) -> ResponseDeclaration {
        const TAG: &str = "responseDeclaration";
        let cardinality_raw = self.text(object, "cardinality");
        let base_type_raw = self.text(object, "baseType");
        let mut declaration = ResponseDeclaration::new(
            self.text(object, "identifier").unwrap_or_default(),
            self.diagnostics.keyword(
                TAG,
                "cardinality",
                cardinality_raw.as_deref(),
                Cardinality::Single,
            ),
            self.diagnostics.keyword(
                TAG,
                "baseType",
                base_type_raw.as_deref(),
                BaseType::Identifier,
            ),
        );

        declaration.correct_response = match object.get("correctResponse") {
            Some(Value::Array(values)) => values.values().filter_map(|v| scalar(&v)).collect(),
            Some(value) => scalar(&value).into_iter().collect(),
            None => Vec::new(),
        };

        if let Some(Value::Object(mapping)) = object.get("mapping") {
            declaration.mapping = Some(self.mapping(&mapping));
        }
        declaration.extra = self.extra(object, TAG, DECLARATION_KEYS);
        declaration
    }

    fn mapping(&mut self, object: &Object) -> Mapping {
        const TAG: &str = "mapping";
        let mut mapping = Mapping {
            default_value: self.number(object, TAG, "defaultValue", 0.0),
            lower_bound: self.optional_number(object, TAG, "lowerBound"),
            upper_bound: self.optional_number(object, TAG, "upperBound"),
            entries: Vec::new(),
            extra: self.extra(object, TAG, MAPPING_KEYS),
        };
        if let Some(Value::Array(entries)) = object.get("entries") {
            for value in entries.values() {
                let Some(entry) = value.as_object() else {
                    self.ignore("mapEntry", TAG);
                    continue;
                };
                mapping.entries.push(MapEntry {
                    key: self.text(entry, "key").unwrap_or_default(),
                    value: self.number(entry, "mapEntry", "value", 0.0),
                    case_sensitive: self.flag(entry, "mapEntry", "caseSensitive", true),
                    extra: self.extra(entry, "mapEntry", ENTRY_KEYS),
                });
            }
        }
        mapping
    }

    fn outcome_declaration(&mut self, object: &Object) -> OutcomeDeclaration {
        const TAG: &str = "outcomeDeclaration";
        let cardinality_raw = self.text(object, "cardinality");
        let base_type_raw = self.text(object, "baseType");
        OutcomeDeclaration {
            identifier: self.text(object, "identifier").unwrap_or_default(),
            cardinality: self.diagnostics.keyword(
                TAG,
                "cardinality",
                cardinality_raw.as_deref(),
                Cardinality::Single,
            ),
            base_type: self.diagnostics.keyword(
                TAG,
                "baseType",
                base_type_raw.as_deref(),
                BaseType::Float,
            ),
            default_value: self.text(object, "defaultValue"),
            normal_maximum: self.optional_number(object, TAG, "normalMaximum"),
            extra: self.extra(object, TAG, OUTCOME_KEYS),
        }
    }

    /// A content list: an array of nodes, or a single node.
    fn content(&mut self, value: &Value) -> Vec<ContentNode> {
        let mut nodes = Vec::new();
        match value {
            Value::Array(array) => {
                for value in array.values() {
                    let node = self.node(&value);
                    super::push_node(&mut nodes, node);
                }
            }
            other => {
                let node = self.node(other);
                super::push_node(&mut nodes, node);
            }
        }
        nodes
    }

    fn optional_content(&mut self, object: &Object, key: &str) -> Option<Vec<ContentNode>> {
        object.get(key).map(|value| self.content(&value))
    }

    fn node(&mut self, value: &Value) -> ContentNode {
        if let Some(text) = string(value) {
            return ContentNode::Text { text };
        }
        let Some(object) = value.as_object() else {
            self.diagnostics.unsupported("value", || {
                "a non-string, non-object content value; kept verbatim".to_string()
            });
            return ContentNode::Unknown(UnknownNode {
                tag: "value".to_string(),
                raw: value.text(),
            });
        };

        let tag = self.text(object, "type").unwrap_or_default();
        let known = match tag.as_str() {
            HOTTEXT => HOTTEXT_KEYS,
            _ if is_xhtml(&tag) => ELEMENT_KEYS,
            _ => &[],
        };
        if !known.is_empty() && !self.extra(object, &tag, known).is_empty() {
            // Unknown members have no place on a content node; keep it whole.
            return ContentNode::Unknown(UnknownNode {
                tag,
                raw: value.text(),
            });
        }

        if is_xhtml(&tag) {
            let attributes = match object.get("attributes") {
                Some(Value::Object(attributes)) => attributes
                    .members()
                    .filter_map(|m| {
                        let key =
                            serde_json::from_str::<String>(&format!("\"{}\"", m.raw_key()?))
                                .ok()?;
                        Some((key, scalar(&m.value()?)?))
                    })
                    .collect(),
                _ => Vec::new(),
            };
            return ContentNode::Element {
                tag,
                attributes,
                children: self.optional_content(object, "children").unwrap_or_default(),
            };
        }

        let interaction = match tag.as_str() {
            CHOICE => Interaction::Choice(self.choice(object, &tag)),
            TEXT_ENTRY => Interaction::TextEntry(TextEntryInteraction {
                response_identifier: self.response_identifier(object, &tag),
                expected_length: self.optional_number(object, &tag, "expectedLength"),
                pattern_mask: self.text(object, "patternMask"),
                placeholder_text: self.text(object, "placeholderText"),
                extra: self.interaction_extra(object, &tag),
            }),
            EXTENDED_TEXT => Interaction::ExtendedText(ExtendedTextInteraction {
                response_identifier: self.response_identifier(object, &tag),
                expected_lines: self.optional_number(object, &tag, "expectedLines"),
                expected_length: self.optional_number(object, &tag, "expectedLength"),
                prompt: self.optional_content(object, "prompt"),
                extra: self.interaction_extra(object, &tag),
            }),
            HOTTEXT_INTERACTION => Interaction::Hottext(HottextInteraction {
                response_identifier: self.response_identifier(object, &tag),
                max_choices: self.number(object, &tag, "maxChoices", 1),
                prompt: self.optional_content(object, "prompt"),
                content: self.optional_content(object, "content").unwrap_or_default(),
                extra: self.interaction_extra(object, &tag),
            }),
            SLIDER => Interaction::Slider(SliderInteraction {
                response_identifier: self.response_identifier(object, &tag),
                lower_bound: self.number(object, &tag, "lowerBound", 0.0),
                upper_bound: self.number(object, &tag, "upperBound", 100.0),
                step: self.number(object, &tag, "step", 1.0),
                step_label: self.flag(object, &tag, "stepLabel", false),
                reverse: self.flag(object, &tag, "reverse", false),
                prompt: self.optional_content(object, "prompt"),
                extra: self.interaction_extra(object, &tag),
            }),
            ORDER => {
                let choice = self.choice(object, &tag);
                Interaction::Order(OrderInteraction {
                    response_identifier: choice.response_identifier,
                    shuffle: choice.shuffle,
                    prompt: choice.prompt,
                    choices: choice.choices,
                    extra: choice.extra,
                })
            }
            HOTTEXT => {
                return ContentNode::Hottext {
                    identifier: self.text(object, "identifier").unwrap_or_default(),
                    children: self.optional_content(object, "children").unwrap_or_default(),
                };
            }
            _ if looks_like_interaction(&tag) => {
                self.diagnostics.unsupported(&tag, || {
                    format!("`{tag}` is not a supported interaction; kept verbatim")
                });
                Interaction::Unknown(UnknownNode {
                    raw: value.text(),
                    tag,
                })
            }
            _ => {
                let kind = if tag.is_empty() { "object" } else { tag.as_str() };
                self.diagnostics.unsupported(kind, || {
                    format!("`{kind}` content is outside the 3.0 vocabulary; kept verbatim")
                });
                return ContentNode::Unknown(UnknownNode {
                    tag: kind.to_string(),
                    raw: value.text(),
                });
            }
        };
        ContentNode::Interaction(interaction)
    }

    fn interaction_extra(&mut self, object: &Object, tag: &str) -> Vec<UnknownNode> {
        let mut known = vec!["type", "responseIdentifier"];
        known.extend_from_slice(interaction_keys(tag));
        self.extra(object, tag, &known)
    }

    fn choice(&mut self, object: &Object, tag: &str) -> ChoiceInteraction {
        let mut interaction = ChoiceInteraction {
            response_identifier: self.response_identifier(object, tag),
            shuffle: self.flag(object, tag, "shuffle", false),
            max_choices: self.number(object, tag, "maxChoices", 1),
            min_choices: self.number(object, tag, "minChoices", 0),
            prompt: self.optional_content(object, "prompt"),
            choices: Vec::new(),
            extra: self.interaction_extra(object, tag),
        };
        if let Some(Value::Array(choices)) = object.get("choices") {
            for value in choices.values() {
                let Some(choice) = value.as_object() else {
                    self.ignore("simpleChoice", tag);
                    continue;
                };
                let simple = SimpleChoice {
                    identifier: self.text(choice, "identifier").unwrap_or_default(),
                    fixed: self.flag(choice, "simpleChoice", "fixed", false),
                    content: self.optional_content(choice, "content").unwrap_or_default(),
                    extra: self.extra(choice, "simpleChoice", SIMPLE_CHOICE_KEYS),
                };
                interaction.choices.push(simple);
            }
        }
        interaction
    }
}
