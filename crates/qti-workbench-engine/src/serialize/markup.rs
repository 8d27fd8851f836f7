//! Markup writer.
//!
//! Items are first lowered to a small [`Node`] tree using the vocabulary of
//! each item's version, then rendered. An element containing text is written
//! inline, exactly; any other element puts each child on its own indented
//! line. The parser drops that layout whitespace again, which is what keeps
//! serialize → parse stable.

use crate::model::{
    ContentNode, Format, Interaction, ItemDocument, OutcomeDeclaration, ResponseDeclaration,
    ResponseProcessing, SimpleChoice, SpecVersion, UnknownNode,
};
use crate::parsing::vocabulary::{
    CORRECT_RESPONSE, HOTTEXT, ITEM, ITEM_BODY, OUTCOME_DECLARATION, RESPONSE_DECLARATION,
    RESPONSE_PROCESSING, TEST, VALUE, attribute_name, element_name,
};

const INDENT: &str = "  ";

enum Node {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<Node>,
    },
    Text(String),
    /// Written as is.
    Raw(String),
}

pub(super) fn write(items: &[ItemDocument]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    let root = match items {
        [item] => with_namespace(Lowering::new(item).item(item), item.spec_version),
        _ => {
            let version = items
                .first()
                .map_or(SpecVersion::V3_0, |item| item.spec_version);
            let children = items
                .iter()
                .map(|item| Lowering::new(item).item(item))
                .collect();
            let test = Node::Element {
                name: element_name(TEST, version),
                attributes: vec![(attribute_name("identifier", version), "items".to_string())],
                children,
            };
            with_namespace(test, version)
        }
    };

    render(&root, 0, false, &mut out);
    out.push('\n');
    out
}

fn with_namespace(node: Node, version: SpecVersion) -> Node {
    let namespace = match version {
        SpecVersion::V2_1 => "http://www.imsglobal.org/xsd/imsqti_v2p1",
        SpecVersion::V3_0 => "http://www.imsglobal.org/xsd/imsqtiasi_v3p0",
    };
    match node {
        Node::Element {
            name,
            mut attributes,
            children,
        } => {
            attributes.insert(0, ("xmlns".to_string(), namespace.to_string()));
            Node::Element {
                name,
                attributes,
                children,
            }
        }
        other => other,
    }
}

fn render(node: &Node, depth: usize, inline: bool, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
        Node::Raw(raw) => out.push_str(raw),
        Node::Element {
            name,
            attributes,
            children,
        } => {
            out.push('<');
            out.push_str(name);
            for (key, value) in attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(value));
                out.push('"');
            }
            if children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');

            let mixed = inline || children.iter().any(|c| matches!(c, Node::Text(_)));
            for child in children {
                if !mixed {
                    out.push('\n');
                    out.push_str(&INDENT.repeat(depth + 1));
                }
                render(child, depth + 1, mixed, out);
            }
            if !mixed {
                out.push('\n');
                out.push_str(&INDENT.repeat(depth));
            }

            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

/// Lowers one item with its own version's names.
struct Lowering {
    version: SpecVersion,
    /// Unknown fragments were read from markup and can be written back as is.
    verbatim: bool,
}

impl Lowering {
    fn new(item: &ItemDocument) -> Self {
        Self {
            version: item.spec_version,
            verbatim: item.format == Format::Markup,
        }
    }

    fn element(
        &self,
        canonical: &str,
        attributes: Vec<(&str, String)>,
        children: Vec<Node>,
    ) -> Node {
        Node::Element {
            name: element_name(canonical, self.version),
            attributes: attributes
                .into_iter()
                .map(|(key, value)| (attribute_name(key, self.version), value))
                .collect(),
            children,
        }
    }

    fn unknown(&self, raw: &str) -> Node {
        if self.verbatim {
            Node::Raw(raw.to_string())
        } else {
            Node::Text(raw.to_string())
        }
    }

    /// Unknown children and sections go back in only when read from markup.
    fn extra(&self, extra: &[UnknownNode]) -> Vec<Node> {
        if !self.verbatim {
            for unknown in extra {
                log::warn!("field `{}` has no markup form and is left out", unknown.tag);
            }
            return Vec::new();
        }
        extra.iter().map(|u| Node::Raw(u.raw.clone())).collect()
    }

    fn item(&self, item: &ItemDocument) -> Node {
        let mut attributes = vec![("identifier", item.id.clone())];
        if let Some(title) = &item.title {
            attributes.push(("title", title.clone()));
        }

        let mut children: Vec<Node> = item
            .response_declarations
            .iter()
            .map(|d| self.response_declaration(d))
            .collect();
        children.extend(
            item.outcome_declarations
                .iter()
                .map(|o| self.outcome_declaration(o)),
        );
        children.push(self.element(ITEM_BODY, vec![], self.content(&item.body)));

        match &item.response_processing {
            ResponseProcessing::Template { uri, .. } => children.push(self.element(
                RESPONSE_PROCESSING,
                vec![("template", uri.clone())],
                vec![],
            )),
            ResponseProcessing::Custom { raw } if self.verbatim => {
                children.push(Node::Raw(raw.clone()))
            }
            ResponseProcessing::Custom { raw } => children.push(self.element(
                RESPONSE_PROCESSING,
                vec![],
                vec![Node::Text(raw.clone())],
            )),
            ResponseProcessing::Absent => {}
        }

        children.extend(self.extra(&item.unknown_sections));

        self.element(ITEM, attributes, children)
    }

    fn response_declaration(&self, declaration: &ResponseDeclaration) -> Node {
        let mut children = Vec::new();
        if !declaration.correct_response.is_empty() {
            children.push(self.element(
                CORRECT_RESPONSE,
                vec![],
                self.values(&declaration.correct_response),
            ));
        }
        if let Some(mapping) = &declaration.mapping {
            let mut attributes = vec![("defaultValue", mapping.default_value.to_string())];
            if let Some(lower) = mapping.lower_bound {
                attributes.push(("lowerBound", lower.to_string()));
            }
            if let Some(upper) = mapping.upper_bound {
                attributes.push(("upperBound", upper.to_string()));
            }
            let entries = mapping
                .entries
                .iter()
                .map(|entry| {
                    self.element(
                        "mapEntry",
                        vec![
                            ("mapKey", entry.key.clone()),
                            ("mappedValue", entry.value.to_string()),
                            ("caseSensitive", entry.case_sensitive.to_string()),
                        ],
                        self.extra(&entry.extra),
                    )
                })
                .chain(self.extra(&mapping.extra))
                .collect();
            children.push(self.element("mapping", attributes, entries));
        }
        children.extend(self.extra(&declaration.extra));

        self.element(
            RESPONSE_DECLARATION,
            vec![
                ("identifier", declaration.identifier.clone()),
                ("cardinality", declaration.cardinality.to_string()),
                ("baseType", declaration.base_type.to_string()),
            ],
            children,
        )
    }

    fn outcome_declaration(&self, outcome: &OutcomeDeclaration) -> Node {
        let mut attributes = vec![
            ("identifier", outcome.identifier.clone()),
            ("cardinality", outcome.cardinality.to_string()),
            ("baseType", outcome.base_type.to_string()),
        ];
        if let Some(maximum) = outcome.normal_maximum {
            attributes.push(("normalMaximum", maximum.to_string()));
        }
        let mut children = match &outcome.default_value {
            Some(value) => vec![self.element(
                "defaultValue",
                vec![],
                self.values(std::slice::from_ref(value)),
            )],
            None => vec![],
        };
        children.extend(self.extra(&outcome.extra));
        self.element(OUTCOME_DECLARATION, attributes, children)
    }

    fn values(&self, values: &[String]) -> Vec<Node> {
        values
            .iter()
            .map(|value| self.element(VALUE, vec![], vec![Node::Text(value.clone())]))
            .collect()
    }

    fn content(&self, nodes: &[ContentNode]) -> Vec<Node> {
        nodes.iter().map(|node| self.node(node)).collect()
    }

    fn node(&self, node: &ContentNode) -> Node {
        match node {
            ContentNode::Text { text } => Node::Text(text.clone()),
            ContentNode::Element {
                tag,
                attributes,
                children,
            } => Node::Element {
                name: tag.clone(),
                attributes: attributes.clone(),
                children: self.content(children),
            },
            ContentNode::Interaction(interaction) => self.interaction(interaction),
            ContentNode::Hottext {
                identifier,
                children,
            } => self.element(
                HOTTEXT,
                vec![("identifier", identifier.clone())],
                self.content(children),
            ),
            ContentNode::Unknown(unknown) => self.unknown(&unknown.raw),
        }
    }

    /// `prompt` first, then the rest.
    fn with_prompt(&self, prompt: &Option<Vec<ContentNode>>, rest: Vec<Node>) -> Vec<Node> {
        let mut children = Vec::with_capacity(rest.len() + 1);
        if let Some(prompt) = prompt {
            children.push(self.element("prompt", vec![], self.content(prompt)));
        }
        children.extend(rest);
        children
    }

    fn choices(&self, choices: &[SimpleChoice]) -> Vec<Node> {
        choices
            .iter()
            .map(|choice| {
                let mut attributes = vec![("identifier", choice.identifier.clone())];
                if choice.fixed {
                    attributes.push(("fixed", "true".to_string()));
                }
                let mut children = self.content(&choice.content);
                children.extend(self.extra(&choice.extra));
                self.element("simpleChoice", attributes, children)
            })
            .collect()
    }

    fn interaction(&self, interaction: &Interaction) -> Node {
        let mut attributes = Vec::new();
        if let Some(id) = interaction.response_identifier()
            && !id.is_empty()
        {
            attributes.push(("responseIdentifier", id.to_string()));
        }

        let children = match interaction {
            Interaction::Choice(choice) | Interaction::MultipleResponse(choice) => {
                attributes.push(("shuffle", choice.shuffle.to_string()));
                attributes.push(("maxChoices", choice.max_choices.to_string()));
                if choice.min_choices != 0 {
                    attributes.push(("minChoices", choice.min_choices.to_string()));
                }
                let mut rest = self.choices(&choice.choices);
                rest.extend(self.extra(&choice.extra));
                self.with_prompt(&choice.prompt, rest)
            }
            Interaction::TextEntry(entry) => {
                if let Some(length) = entry.expected_length {
                    attributes.push(("expectedLength", length.to_string()));
                }
                if let Some(mask) = &entry.pattern_mask {
                    attributes.push(("patternMask", mask.clone()));
                }
                if let Some(placeholder) = &entry.placeholder_text {
                    attributes.push(("placeholderText", placeholder.clone()));
                }
                self.extra(&entry.extra)
            }
            Interaction::ExtendedText(text) => {
                if let Some(lines) = text.expected_lines {
                    attributes.push(("expectedLines", lines.to_string()));
                }
                if let Some(length) = text.expected_length {
                    attributes.push(("expectedLength", length.to_string()));
                }
                self.with_prompt(&text.prompt, self.extra(&text.extra))
            }
            Interaction::Hottext(hottext) => {
                attributes.push(("maxChoices", hottext.max_choices.to_string()));
                let mut rest = self.content(&hottext.content);
                rest.extend(self.extra(&hottext.extra));
                self.with_prompt(&hottext.prompt, rest)
            }
            Interaction::Slider(slider) => {
                attributes.push(("lowerBound", slider.lower_bound.to_string()));
                attributes.push(("upperBound", slider.upper_bound.to_string()));
                attributes.push(("step", slider.step.to_string()));
                if slider.step_label {
                    attributes.push(("stepLabel", "true".to_string()));
                }
                if slider.reverse {
                    attributes.push(("reverse", "true".to_string()));
                }
                self.with_prompt(&slider.prompt, self.extra(&slider.extra))
            }
            Interaction::Order(order) => {
                attributes.push(("shuffle", order.shuffle.to_string()));
                let mut rest = self.choices(&order.choices);
                rest.extend(self.extra(&order.extra));
                self.with_prompt(&order.prompt, rest)
            }
            Interaction::Unknown(unknown) => return self.unknown(&unknown.raw),
        };

        self.element(interaction.tag(), attributes, children)
    }
}
