//! Structured-object writer.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::value::RawValue;

use crate::model::{
    ContentNode, Format, Interaction, ItemDocument, MapEntry, Mapping, OutcomeDeclaration,
    ResponseDeclaration, ResponseProcessing, SimpleChoice, UnknownNode,
};
use crate::parsing::vocabulary::{HOTTEXT, ITEM};

pub(super) fn write(items: &[ItemDocument]) -> String {
    let encoded: Vec<ItemObject<'_>> = items.iter().map(ItemObject).collect();
    let result = match encoded.as_slice() {
        [item] => serde_json::to_string_pretty(item),
        all => serde_json::to_string_pretty(all),
    };
    match result {
        Ok(mut text) => {
            text.push('\n');
            text
        }
        Err(err) => {
            log::error!("failed to encode {} item(s): {err}", items.len());
            String::new()
        }
    }
}

/// A fragment read from a structured object goes back in as is; anything
/// else becomes a string.
fn fragment(raw: &str, verbatim: bool) -> Fragment<'_> {
    if verbatim && let Ok(value) = RawValue::from_string(raw.to_string()) {
        return Fragment::Raw(value);
    }
    Fragment::Text(raw)
}

#[derive(Serialize)]
#[serde(untagged)]
enum Fragment<'a> {
    Raw(Box<RawValue>),
    Text(&'a str),
}

/// Unknown members, written after the known ones.
#[derive(Clone, Copy)]
struct Extra<'a> {
    members: &'a [UnknownNode],
    verbatim: bool,
}

impl<'a> Extra<'a> {
    fn new(members: &'a [UnknownNode], verbatim: bool) -> Self {
        Self { members, verbatim }
    }
}

impl Default for Extra<'_> {
    fn default() -> Self {
        Self::new(&[], false)
    }
}

impl Serialize for Extra<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.members
                .iter()
                .map(|member| (&member.tag, fragment(&member.raw, self.verbatim))),
        )
    }
}

/// Members are written in a fixed order, unknown fields last.
struct ItemObject<'a>(&'a ItemDocument);

impl Serialize for ItemObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let item = self.0;
        let verbatim = item.format == Format::StructuredObject;
        let mut map = serializer.serialize_map(None)?;

        map.serialize_entry("type", ITEM)?;
        map.serialize_entry("identifier", &item.id)?;
        if let Some(title) = &item.title {
            map.serialize_entry("title", title)?;
        }
        if !item.response_declarations.is_empty() {
            let declarations: Vec<_> = item
                .response_declarations
                .iter()
                .map(|d| DeclarationObject::new(d, verbatim))
                .collect();
            map.serialize_entry("responseDeclarations", &declarations)?;
        }
        if !item.outcome_declarations.is_empty() {
            let outcomes: Vec<_> = item
                .outcome_declarations
                .iter()
                .map(|o| OutcomeObject::new(o, verbatim))
                .collect();
            map.serialize_entry("outcomeDeclarations", &outcomes)?;
        }
        map.serialize_entry("itemBody", &content(&item.body, verbatim))?;

        match &item.response_processing {
            ResponseProcessing::Template { uri, .. } => {
                map.serialize_entry("responseProcessing", &Template { template: uri })?
            }
            ResponseProcessing::Custom { raw } => match fragment(raw, verbatim) {
                raw @ Fragment::Raw(_) => map.serialize_entry("responseProcessing", &raw)?,
                Fragment::Text(rules) => {
                    map.serialize_entry("responseProcessing", &Rules { rules })?
                }
            },
            ResponseProcessing::Absent => {}
        }

        for section in &item.unknown_sections {
            map.serialize_entry(&section.tag, &fragment(&section.raw, verbatim))?;
        }
        map.end()
    }
}

fn is_blank(text: &&str) -> bool {
    text.is_empty()
}

fn no_values(values: &&[String]) -> bool {
    values.is_empty()
}

#[derive(Serialize)]
struct Template<'a> {
    template: &'a str,
}

#[derive(Serialize)]
struct Rules<'a> {
    rules: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeclarationObject<'a> {
    identifier: &'a str,
    cardinality: &'static str,
    base_type: &'static str,
    #[serde(skip_serializing_if = "no_values")]
    correct_response: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    mapping: Option<MappingObject<'a>>,
    #[serde(flatten)]
    extra: Extra<'a>,
}

impl<'a> DeclarationObject<'a> {
    fn new(declaration: &'a ResponseDeclaration, verbatim: bool) -> Self {
        Self {
            identifier: &declaration.identifier,
            cardinality: declaration.cardinality.name(),
            base_type: declaration.base_type.name(),
            correct_response: &declaration.correct_response,
            mapping: declaration
                .mapping
                .as_ref()
                .map(|m| MappingObject::new(m, verbatim)),
            extra: Extra::new(&declaration.extra, verbatim),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingObject<'a> {
    default_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    lower_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upper_bound: Option<f64>,
    entries: Vec<EntryObject<'a>>,
    #[serde(flatten)]
    extra: Extra<'a>,
}

impl<'a> MappingObject<'a> {
    fn new(mapping: &'a Mapping, verbatim: bool) -> Self {
        Self {
            default_value: mapping.default_value,
            lower_bound: mapping.lower_bound,
            upper_bound: mapping.upper_bound,
            entries: mapping
                .entries
                .iter()
                .map(|e| EntryObject::new(e, verbatim))
                .collect(),
            extra: Extra::new(&mapping.extra, verbatim),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryObject<'a> {
    key: &'a str,
    value: f64,
    case_sensitive: bool,
    #[serde(flatten)]
    extra: Extra<'a>,
}

impl<'a> EntryObject<'a> {
    fn new(entry: &'a MapEntry, verbatim: bool) -> Self {
        Self {
            key: &entry.key,
            value: entry.value,
            case_sensitive: entry.case_sensitive,
            extra: Extra::new(&entry.extra, verbatim),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeObject<'a> {
    identifier: &'a str,
    cardinality: &'static str,
    base_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normal_maximum: Option<f64>,
    #[serde(flatten)]
    extra: Extra<'a>,
}

impl<'a> OutcomeObject<'a> {
    fn new(outcome: &'a OutcomeDeclaration, verbatim: bool) -> Self {
        Self {
            identifier: &outcome.identifier,
            cardinality: outcome.cardinality.name(),
            base_type: outcome.base_type.name(),
            default_value: outcome.default_value.as_deref(),
            normal_maximum: outcome.normal_maximum,
            extra: Extra::new(&outcome.extra, verbatim),
        }
    }
}

fn content(nodes: &[ContentNode], verbatim: bool) -> Vec<NodeObject<'_>> {
    nodes.iter().map(|node| node_object(node, verbatim)).collect()
}

fn optional_content(
    nodes: &Option<Vec<ContentNode>>,
    verbatim: bool,
) -> Option<Vec<NodeObject<'_>>> {
    nodes.as_ref().map(|nodes| content(nodes, verbatim))
}

#[derive(Serialize)]
#[serde(untagged)]
enum NodeObject<'a> {
    Text(&'a str),
    Element(ElementObject<'a>),
    Hottext(HottextObject<'a>),
    Interaction(InteractionObject<'a>),
    Fragment(Fragment<'a>),
}

#[derive(Serialize)]
struct ElementObject<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    attributes: Attributes<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeObject<'a>>,
}

struct Attributes<'a>(&'a [(String, String)]);

impl Attributes<'_> {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Attributes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

#[derive(Serialize)]
struct HottextObject<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    identifier: &'a str,
    children: Vec<NodeObject<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChoiceObject<'a> {
    identifier: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    fixed: bool,
    content: Vec<NodeObject<'a>>,
    #[serde(flatten)]
    extra: Extra<'a>,
}

fn choices(choices: &[SimpleChoice], verbatim: bool) -> Vec<ChoiceObject<'_>> {
    choices
        .iter()
        .map(|choice| ChoiceObject {
            identifier: &choice.identifier,
            fixed: choice.fixed,
            content: content(&choice.content, verbatim),
            extra: Extra::new(&choice.extra, verbatim),
        })
        .collect()
}

/// Every interaction field, optional ones skipped when absent.
#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct InteractionObject<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    response_identifier: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shuffle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_choices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_choices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_lines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern_mask: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lower_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upper_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step_label: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reverse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<Vec<NodeObject<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    choices: Option<Vec<ChoiceObject<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Vec<NodeObject<'a>>>,
    #[serde(flatten)]
    extra: Extra<'a>,
}

fn node_object(node: &ContentNode, verbatim: bool) -> NodeObject<'_> {
    match node {
        ContentNode::Text { text } => NodeObject::Text(text),
        ContentNode::Element {
            tag,
            attributes,
            children,
        } => NodeObject::Element(ElementObject {
            kind: tag,
            attributes: Attributes(attributes),
            children: content(children, verbatim),
        }),
        ContentNode::Hottext {
            identifier,
            children,
        } => NodeObject::Hottext(HottextObject {
            kind: HOTTEXT,
            identifier,
            children: content(children, verbatim),
        }),
        ContentNode::Interaction(Interaction::Unknown(unknown)) | ContentNode::Unknown(unknown) => {
            NodeObject::Fragment(fragment(&unknown.raw, verbatim))
        }
        ContentNode::Interaction(interaction) => {
            NodeObject::Interaction(interaction_object(interaction, verbatim))
        }
    }
}

fn interaction_object(interaction: &Interaction, verbatim: bool) -> InteractionObject<'_> {
    let base = InteractionObject {
        kind: interaction.tag(),
        response_identifier: interaction.response_identifier().unwrap_or_default(),
        ..InteractionObject::default()
    };
    match interaction {
        Interaction::Choice(choice) | Interaction::MultipleResponse(choice) => InteractionObject {
            shuffle: Some(choice.shuffle),
            max_choices: Some(choice.max_choices),
            min_choices: (choice.min_choices != 0).then_some(choice.min_choices),
            prompt: optional_content(&choice.prompt, verbatim),
            choices: Some(choices(&choice.choices, verbatim)),
            extra: Extra::new(&choice.extra, verbatim),
            ..base
        },
        Interaction::TextEntry(entry) => InteractionObject {
            expected_length: entry.expected_length,
            pattern_mask: entry.pattern_mask.as_deref(),
            placeholder_text: entry.placeholder_text.as_deref(),
            extra: Extra::new(&entry.extra, verbatim),
            ..base
        },
        Interaction::ExtendedText(text) => InteractionObject {
            expected_lines: text.expected_lines,
            expected_length: text.expected_length,
            prompt: optional_content(&text.prompt, verbatim),
            extra: Extra::new(&text.extra, verbatim),
            ..base
        },
        Interaction::Hottext(hottext) => InteractionObject {
            max_choices: Some(hottext.max_choices),
            prompt: optional_content(&hottext.prompt, verbatim),
            content: Some(content(&hottext.content, verbatim)),
            extra: Extra::new(&hottext.extra, verbatim),
            ..base
        },
        Interaction::Slider(slider) => InteractionObject {
            lower_bound: Some(slider.lower_bound),
            upper_bound: Some(slider.upper_bound),
            step: Some(slider.step),
            step_label: slider.step_label.then_some(true),
            reverse: slider.reverse.then_some(true),
            prompt: optional_content(&slider.prompt, verbatim),
            extra: Extra::new(&slider.extra, verbatim),
            ..base
        },
        Interaction::Order(order) => InteractionObject {
            shuffle: Some(order.shuffle),
            prompt: optional_content(&order.prompt, verbatim),
            choices: Some(choices(&order.choices, verbatim)),
            extra: Extra::new(&order.extra, verbatim),
            ..base
        },
        Interaction::Unknown(_) => base,
    }
}
