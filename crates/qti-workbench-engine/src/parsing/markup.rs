//! Markup CST → model.
//!
//! The version of each item comes from its own element name, so a bundle may
//! mix 2.1 and 3.0 items. Everything below the item is read with that
//! version's spelling; a name in the other spelling is simply unknown.

use qti_workbench_syntax::ast::{Element, root_elements};
use qti_workbench_syntax::{Syntax, SyntaxKind};

use super::vocabulary::{
    CHOICE, CORRECT_RESPONSE, EXTENDED_TEXT, HOTTEXT, HOTTEXT_INTERACTION, ITEM, ITEM_BODY,
    ORDER, OUTCOME_DECLARATION, RESPONSE_DECLARATION, RESPONSE_PROCESSING, SLIDER, TEXT_ENTRY,
    VALUE, WRAPPERS, attribute_name, canonical_name, is_xhtml, looks_like_interaction, version_of,
};
use super::{
    Container, Diagnostics, Located, LocatedItem, drop_layout_whitespace, finish_item,
    has_error_in, push_text,
};
use crate::model::content::plain_text;
use crate::model::diagnostics::Tally;
use crate::model::{
    BaseType, Cardinality, ChoiceInteraction, ContentNode, ExtendedTextInteraction, Format,
    HottextInteraction, Interaction, ItemDocument, MapEntry, Mapping, OrderInteraction,
    OutcomeDeclaration, ResponseDeclaration, ResponseProcessing, SimpleChoice, SliderInteraction,
    SpecVersion, TextEntryInteraction, UnknownNode, Warning,
};

pub(super) fn locate(source: &str) -> Located {
    let parse = qti_workbench_syntax::parse(source, Syntax::Markup);
    let root = parse.syntax();
    let mut walker = Walker {
        source,
        errors: parse.errors(),
        items: Vec::new(),
        slot: None,
        tally: Tally::default(),
    };

    let roots: Vec<Element> = root_elements(&root).collect();
    for element in &roots {
        walker.visit(element);
    }

    let container = if roots.is_empty() {
        Container::Empty
    } else {
        Container::Markup { slot: walker.slot }
    };

    Located {
        items: walker.items,
        container,
        errors: parse.errors().to_vec(),
        tally: walker.tally,
    }
}

/// Finds items anywhere below the roots.
struct Walker<'a> {
    source: &'a str,
    errors: &'a [qti_workbench_syntax::SyntaxError],
    items: Vec<LocatedItem>,
    slot: Option<usize>,
    tally: Tally,
}

impl Walker<'_> {
    /// Returns true when an item was found at or below `element`.
    fn visit(&mut self, element: &Element) -> bool {
        let tag = element.name().unwrap_or_default();
        let version = version_of(&tag);
        let canonical = canonical_name(&tag, version);

        if canonical.as_deref() == Some(ITEM) {
            let range = element.range();
            let id = element
                .attribute("identifier")
                .map(|raw| decode(&raw).to_string());
            let item = (!has_error_in(self.errors, &range))
                .then(|| ItemReader::read(self.source, element, version));
            self.items.push(LocatedItem { range, id, item });
            return true;
        }

        if canonical
            .as_deref()
            .is_some_and(|name| WRAPPERS.contains(&name))
            && let Some(end_tag) = element.end_tag()
        {
            self.slot = Some(usize::from(end_tag.text_range().start()));
        }

        let mut found = false;
        for child in element.child_elements() {
            found |= self.visit(&child);
        }

        let known = canonical
            .as_deref()
            .is_some_and(|name| WRAPPERS.contains(&name));
        if !found && !known {
            self.tally.record(&tag, || {
                format!("<{tag}> is not an item or item container; ignored")
            });
        }
        found
    }
}

pub(crate) fn decode(raw: &str) -> std::borrow::Cow<'_, str> {
    html_escape::decode_html_entities(raw)
}

/// Text between `<![CDATA[` and `]]>`.
fn cdata_text(token: &str) -> &str {
    token
        .strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .unwrap_or(token)
}

/// Reads one item element with a fixed vocabulary version.
struct ItemReader<'a> {
    source: &'a str,
    version: SpecVersion,
    diagnostics: Diagnostics,
}

impl<'a> ItemReader<'a> {
    fn read(source: &'a str, element: &Element, version: SpecVersion) -> ItemDocument {
        let mut reader = ItemReader {
            source,
            version,
            diagnostics: Diagnostics::default(),
        };
        let mut item = ItemDocument::new(
            reader.attr(element, "identifier").unwrap_or_default(),
            Format::Markup,
            version,
        );
        item.title = reader.attr(element, "title");

        for child in element.child_elements() {
            let tag = child.name().unwrap_or_default();
            match reader.canonical(&tag).as_deref() {
                Some(RESPONSE_DECLARATION) => {
                    let declaration = reader.response_declaration(&child, &tag);
                    item.response_declarations.push(declaration);
                }
                Some(OUTCOME_DECLARATION) => {
                    let outcome = reader.outcome_declaration(&child, &tag);
                    item.outcome_declarations.push(outcome);
                }
                Some(ITEM_BODY) => {
                    let mut body = reader.content(&child);
                    item.body.append(&mut body);
                }
                Some(RESPONSE_PROCESSING) => {
                    item.response_processing = match reader.attr(&child, "template") {
                        Some(uri) => ResponseProcessing::template(uri),
                        None => ResponseProcessing::Custom {
                            raw: reader.raw(&child),
                        },
                    };
                }
                _ => {
                    reader.diagnostics.unsupported(&tag, || {
                        format!("<{tag}> is not modeled; kept verbatim")
                    });
                    item.unknown_sections.push(UnknownNode {
                        tag: tag.clone(),
                        raw: reader.raw(&child),
                    });
                }
            }
        }

        finish_item(&mut item, reader.diagnostics);
        item
    }

    fn canonical(&self, tag: &str) -> Option<String> {
        canonical_name(tag, self.version)
    }

    /// Decoded value of a vocabulary attribute.
    fn attr(&self, element: &Element, canonical: &str) -> Option<String> {
        element
            .attribute(&attribute_name(canonical, self.version))
            .map(|raw| decode(&raw).into_owned())
    }

    fn raw(&self, element: &Element) -> String {
        self.source[element.range()].to_string()
    }

    fn number<T>(&mut self, element: &Element, tag: &str, attribute: &str, default: T) -> T
    where
        T: std::str::FromStr + std::fmt::Display,
    {
        let raw = self.attr(element, attribute);
        self.diagnostics
            .number(tag, attribute, raw.as_deref(), default)
    }

    fn optional_number<T: std::str::FromStr>(
        &mut self,
        element: &Element,
        tag: &str,
        attribute: &str,
    ) -> Option<T> {
        let raw = self.attr(element, attribute);
        self.diagnostics
            .optional_number(tag, attribute, raw.as_deref())
    }

    fn flag(&mut self, element: &Element, tag: &str, attribute: &str, default: bool) -> bool {
        let raw = self.attr(element, attribute);
        self.diagnostics
            .keyword(tag, attribute, raw.as_deref(), default)
    }

    fn response_identifier(&mut self, element: &Element, tag: &str) -> String {
        self.attr(element, "responseIdentifier").unwrap_or_else(|| {
            self.diagnostics
                .warnings
                .push(Warning::MissingResponseIdentifier {
                    interaction: tag.to_string(),
                });
            String::new()
        })
    }

    /// A child with no place in the model, kept for regeneration.
    fn keep(&mut self, child: &Element, parent: &str) -> UnknownNode {
        let tag = child.name().unwrap_or_default();
        self.diagnostics.unsupported(&tag, || {
            format!("<{tag}> inside <{parent}> is not modeled; kept verbatim")
        });
        UnknownNode {
            raw: self.raw(child),
            tag,
        }
    }

    /// Every child element is unknown.
    fn keep_all(&mut self, element: &Element, tag: &str) -> Vec<UnknownNode> {
        element
            .child_elements()
            .map(|child| self.keep(&child, tag))
            .collect()
    }

    fn response_declaration(&mut self, element: &Element, tag: &str) -> ResponseDeclaration {
        let cardinality_raw = self.attr(element, "cardinality");
        let base_type_raw = self.attr(element, "baseType");
        let cardinality =
            self.diagnostics
                .keyword(tag, "cardinality", cardinality_raw.as_deref(), Cardinality::Single);
        let base_type =
            self.diagnostics
                .keyword(tag, "baseType", base_type_raw.as_deref(), BaseType::Identifier);

        let mut declaration = ResponseDeclaration::new(
            self.attr(element, "identifier").unwrap_or_default(),
            cardinality,
            base_type,
        );

        for child in element.child_elements() {
            let child_tag = child.name().unwrap_or_default();
            match self.canonical(&child_tag).as_deref() {
                Some(CORRECT_RESPONSE) => {
                    declaration.correct_response = self.values(&child);
                }
                Some("mapping") => declaration.mapping = Some(self.mapping(&child, &child_tag)),
                _ => {
                    let unknown = self.keep(&child, tag);
                    declaration.extra.push(unknown);
                }
            }
        }
        declaration
    }

    /// Trimmed text of each `value` child.
    fn values(&mut self, element: &Element) -> Vec<String> {
        let mut values = Vec::new();
        for child in element.child_elements() {
            let tag = child.name().unwrap_or_default();
            if self.canonical(&tag).as_deref() == Some(VALUE) {
                let content = self.content(&child);
                values.push(plain_text(&content).trim().to_string());
            }
        }
        values
    }

    fn mapping(&mut self, element: &Element, tag: &str) -> Mapping {
        let mut mapping = Mapping {
            default_value: self.number(element, tag, "defaultValue", 0.0),
            lower_bound: self.optional_number(element, tag, "lowerBound"),
            upper_bound: self.optional_number(element, tag, "upperBound"),
            entries: Vec::new(),
            extra: Vec::new(),
        };
        for child in element.child_elements() {
            let child_tag = child.name().unwrap_or_default();
            if self.canonical(&child_tag).as_deref() == Some("mapEntry") {
                mapping.entries.push(MapEntry {
                    key: self.attr(&child, "mapKey").unwrap_or_default(),
                    value: self.number(&child, &child_tag, "mappedValue", 0.0),
                    case_sensitive: self.flag(&child, &child_tag, "caseSensitive", true),
                    extra: self.keep_all(&child, &child_tag),
                });
            } else {
                let unknown = self.keep(&child, tag);
                mapping.extra.push(unknown);
            }
        }
        mapping
    }

    fn outcome_declaration(&mut self, element: &Element, tag: &str) -> OutcomeDeclaration {
        let cardinality_raw = self.attr(element, "cardinality");
        let base_type_raw = self.attr(element, "baseType");
        let mut outcome = OutcomeDeclaration {
            identifier: self.attr(element, "identifier").unwrap_or_default(),
            cardinality: self.diagnostics.keyword(
                tag,
                "cardinality",
                cardinality_raw.as_deref(),
                Cardinality::Single,
            ),
            base_type: self.diagnostics.keyword(
                tag,
                "baseType",
                base_type_raw.as_deref(),
                BaseType::Float,
            ),
            default_value: None,
            normal_maximum: self.optional_number(element, tag, "normalMaximum"),
            extra: Vec::new(),
        };
        for child in element.child_elements() {
            let child_tag = child.name().unwrap_or_default();
            if self.canonical(&child_tag).as_deref() == Some("defaultValue") {
                outcome.default_value = self.values(&child).into_iter().next();
            } else {
                let unknown = self.keep(&child, tag);
                outcome.extra.push(unknown);
            }
        }
        outcome
    }

    /// Mixed content of an element.
    fn content(&mut self, element: &Element) -> Vec<ContentNode> {
        self.content_with_prompt(element, None)
    }

    /// Mixed content, pulling a `prompt` child into `prompt` when a slot is given.
    fn content_with_prompt(
        &mut self,
        element: &Element,
        mut prompt: Option<&mut Option<Vec<ContentNode>>>,
    ) -> Vec<ContentNode> {
        let mut nodes = Vec::new();
        for child in element.content() {
            if let Some(token) = child.as_token() {
                match token.kind() {
                    SyntaxKind::TEXT => push_text(&mut nodes, decode(token.text()).into_owned()),
                    SyntaxKind::CDATA => {
                        push_text(&mut nodes, cdata_text(token.text()).to_string())
                    }
                    _ => {}
                }
                continue;
            }
            let Some(child) = child.into_node().and_then(Element::cast) else {
                continue;
            };
            let tag = child.name().unwrap_or_default();
            if let Some(slot) = prompt.as_deref_mut()
                && self.canonical(&tag).as_deref() == Some("prompt")
            {
                *slot = Some(self.content(&child));
                continue;
            }
            let node = self.node(&child, tag);
            nodes.push(node);
        }
        drop_layout_whitespace(&mut nodes);
        nodes
    }

    fn node(&mut self, element: &Element, tag: String) -> ContentNode {
        if is_xhtml(&tag) {
            let attributes = element
                .attributes()
                .filter_map(|a| Some((a.name()?, decode(&a.raw_value()?).into_owned())))
                .collect();
            return ContentNode::Element {
                tag,
                attributes,
                children: self.content(element),
            };
        }

        let interaction = match self.canonical(&tag).as_deref() {
            Some(CHOICE) => Interaction::Choice(self.choice(element, &tag)),
            Some(TEXT_ENTRY) => Interaction::TextEntry(TextEntryInteraction {
                response_identifier: self.response_identifier(element, &tag),
                expected_length: self.optional_number(element, &tag, "expectedLength"),
                pattern_mask: self.attr(element, "patternMask"),
                placeholder_text: self.attr(element, "placeholderText"),
                extra: self.keep_all(element, &tag),
            }),
            Some(EXTENDED_TEXT) => {
                let mut interaction = ExtendedTextInteraction {
                    response_identifier: self.response_identifier(element, &tag),
                    expected_lines: self.optional_number(element, &tag, "expectedLines"),
                    expected_length: self.optional_number(element, &tag, "expectedLength"),
                    prompt: None,
                    extra: Vec::new(),
                };
                interaction.extra = self.prompt_only(element, &tag, &mut interaction.prompt);
                Interaction::ExtendedText(interaction)
            }
            Some(HOTTEXT_INTERACTION) => {
                let mut interaction = HottextInteraction {
                    response_identifier: self.response_identifier(element, &tag),
                    max_choices: self.number(element, &tag, "maxChoices", 1),
                    prompt: None,
                    content: Vec::new(),
                    extra: Vec::new(),
                };
                interaction.content =
                    self.content_with_prompt(element, Some(&mut interaction.prompt));
                Interaction::Hottext(interaction)
            }
            Some(SLIDER) => {
                let mut interaction = SliderInteraction {
                    response_identifier: self.response_identifier(element, &tag),
                    lower_bound: self.number(element, &tag, "lowerBound", 0.0),
                    upper_bound: self.number(element, &tag, "upperBound", 100.0),
                    step: self.number(element, &tag, "step", 1.0),
                    step_label: self.flag(element, &tag, "stepLabel", false),
                    reverse: self.flag(element, &tag, "reverse", false),
                    prompt: None,
                    extra: Vec::new(),
                };
                interaction.extra = self.prompt_only(element, &tag, &mut interaction.prompt);
                Interaction::Slider(interaction)
            }
            Some(ORDER) => {
                let choice = self.choice(element, &tag);
                Interaction::Order(OrderInteraction {
                    response_identifier: choice.response_identifier,
                    shuffle: choice.shuffle,
                    prompt: choice.prompt,
                    choices: choice.choices,
                    extra: choice.extra,
                })
            }
            Some(HOTTEXT) => {
                return ContentNode::Hottext {
                    identifier: self.attr(element, "identifier").unwrap_or_default(),
                    children: self.content(element),
                };
            }
            _ if looks_like_interaction(&tag) => {
                self.diagnostics.unsupported(&tag, || {
                    format!("<{tag}> is not a supported interaction; kept verbatim")
                });
                Interaction::Unknown(UnknownNode {
                    raw: self.raw(element),
                    tag,
                })
            }
            _ => {
                let version = self.version;
                self.diagnostics.unsupported(&tag, || {
                    format!("<{tag}> is outside the {version} content vocabulary; kept verbatim")
                });
                return ContentNode::Unknown(UnknownNode {
                    raw: self.raw(element),
                    tag,
                });
            }
        };
        ContentNode::Interaction(interaction)
    }

    /// Shared by choice and order interactions: a prompt plus simple choices.
    fn choice(&mut self, element: &Element, tag: &str) -> ChoiceInteraction {
        let mut interaction = ChoiceInteraction {
            response_identifier: self.response_identifier(element, tag),
            shuffle: self.flag(element, tag, "shuffle", false),
            max_choices: self.number(element, tag, "maxChoices", 1),
            min_choices: self.number(element, tag, "minChoices", 0),
            prompt: None,
            choices: Vec::new(),
            extra: Vec::new(),
        };
        for child in element.child_elements() {
            let child_tag = child.name().unwrap_or_default();
            match self.canonical(&child_tag).as_deref() {
                Some("prompt") => interaction.prompt = Some(self.content(&child)),
                Some("simpleChoice") => {
                    let choice = SimpleChoice {
                        identifier: self.attr(&child, "identifier").unwrap_or_default(),
                        fixed: self.flag(&child, &child_tag, "fixed", false),
                        content: self.content(&child),
                        extra: Vec::new(),
                    };
                    interaction.choices.push(choice);
                }
                _ => {
                    let unknown = self.keep(&child, tag);
                    interaction.extra.push(unknown);
                }
            }
        }
        interaction
    }

    /// Reads `prompt` into its slot and returns the other children.
    fn prompt_only(
        &mut self,
        element: &Element,
        tag: &str,
        prompt: &mut Option<Vec<ContentNode>>,
    ) -> Vec<UnknownNode> {
        let mut extra = Vec::new();
        for child in element.child_elements() {
            let child_tag = child.name().unwrap_or_default();
            if self.canonical(&child_tag).as_deref() == Some("prompt") {
                *prompt = Some(self.content(&child));
            } else {
                extra.push(self.keep(&child, tag));
            }
        }
        extra
    }
}
