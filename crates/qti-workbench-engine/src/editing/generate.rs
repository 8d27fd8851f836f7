//! Minimal items for authoring from scratch.

use crate::model::{
    BaseType, Cardinality, ChoiceInteraction, ContentNode, ExtendedTextInteraction, Format,
    HottextInteraction, Interaction, InteractionKind, ItemDocument, MapEntry, Mapping,
    OrderInteraction, OutcomeDeclaration, ResponseDeclaration, ResponseProcessing, SimpleChoice,
    SliderInteraction, SpecVersion, TemplateKind, TextEntryInteraction,
};
use crate::serialize::serialize;

const RESPONSE: &str = "RESPONSE";

/// Text of a new item of `kind`. The result parses without errors, warnings
/// or unsupported elements. Structured objects are always 3.0, whatever
/// `version` says.
pub fn generate(kind: InteractionKind, id: &str, format: Format, version: SpecVersion) -> String {
    let version = match format {
        Format::Markup => version,
        Format::StructuredObject => SpecVersion::V3_0,
    };
    let item = template(kind, id, format, version);
    log::debug!("generated {kind} item `{id}` as {format} {version}");
    serialize(&[item], format)
}

fn template(kind: InteractionKind, id: &str, format: Format, version: SpecVersion) -> ItemDocument {
    let mut item = ItemDocument::new(id, format, version);
    item.title = Some(format!("New {kind} item"));
    item.outcome_declarations.push(OutcomeDeclaration {
        identifier: "SCORE".into(),
        cardinality: Cardinality::Single,
        base_type: BaseType::Float,
        default_value: Some("0".into()),
        normal_maximum: None,
        extra: Vec::new(),
    });

    let mut processing = TemplateKind::MatchCorrect;
    let (declaration, body) = match kind {
        InteractionKind::Choice => (
            declaration(Cardinality::Single, BaseType::Identifier, &["A"]),
            vec![ContentNode::Interaction(Interaction::Choice(choice(1)))],
        ),
        InteractionKind::MultipleResponse => {
            let mut declaration =
                declaration(Cardinality::Multiple, BaseType::Identifier, &["A", "C"]);
            declaration.mapping = Some(Mapping {
                default_value: 0.0,
                lower_bound: Some(0.0),
                upper_bound: None,
                entries: vec![entry("A", 1.0), entry("B", -1.0), entry("C", 1.0)],
                extra: Vec::new(),
            });
            processing = TemplateKind::MapResponse;
            (
                declaration,
                vec![ContentNode::Interaction(Interaction::MultipleResponse(
                    choice(0),
                ))],
            )
        }
        InteractionKind::TextEntry => (
            declaration(Cardinality::Single, BaseType::String, &["answer"]),
            vec![ContentNode::element(
                "p",
                vec![
                    ContentNode::text("The answer is "),
                    ContentNode::Interaction(Interaction::TextEntry(TextEntryInteraction {
                        response_identifier: RESPONSE.into(),
                        expected_length: Some(15),
                        pattern_mask: None,
                        placeholder_text: None,
                        extra: Vec::new(),
                    })),
                    ContentNode::text("."),
                ],
            )],
        ),
        InteractionKind::ExtendedText => (
            declaration(Cardinality::Single, BaseType::String, &[]),
            vec![ContentNode::Interaction(Interaction::ExtendedText(
                ExtendedTextInteraction {
                    response_identifier: RESPONSE.into(),
                    expected_lines: Some(5),
                    expected_length: None,
                    prompt: Some(vec![ContentNode::text("Write your answer.")]),
                    extra: Vec::new(),
                },
            ))],
        ),
        InteractionKind::Hottext => (
            declaration(Cardinality::Single, BaseType::Identifier, &["H2"]),
            vec![ContentNode::Interaction(Interaction::Hottext(HottextInteraction {
                response_identifier: RESPONSE.into(),
                max_choices: 1,
                prompt: Some(vec![ContentNode::text("Select the correct word.")]),
                content: vec![ContentNode::element(
                    "p",
                    vec![
                        ContentNode::text("The sky is "),
                        hottext("H1", "green"),
                        ContentNode::text(" or "),
                        hottext("H2", "blue"),
                        ContentNode::text("."),
                    ],
                )],
                extra: Vec::new(),
            }))],
        ),
        InteractionKind::Slider => (
            declaration(Cardinality::Single, BaseType::Integer, &["50"]),
            vec![ContentNode::Interaction(Interaction::Slider(SliderInteraction {
                response_identifier: RESPONSE.into(),
                lower_bound: 0.0,
                upper_bound: 100.0,
                step: 1.0,
                step_label: false,
                reverse: false,
                prompt: Some(vec![ContentNode::text("Choose a value.")]),
                extra: Vec::new(),
            }))],
        ),
        InteractionKind::Order => (
            declaration(Cardinality::Ordered, BaseType::Identifier, &["A", "B", "C"]),
            vec![ContentNode::Interaction(Interaction::Order(OrderInteraction {
                response_identifier: RESPONSE.into(),
                shuffle: true,
                prompt: Some(vec![ContentNode::text("Put the options in order.")]),
                choices: options(),
                extra: Vec::new(),
            }))],
        ),
    };

    item.response_declarations.push(declaration);
    item.body = body;
    item.response_processing = match kind {
        InteractionKind::ExtendedText => ResponseProcessing::Absent,
        _ => processing
            .uri(version)
            .map_or(ResponseProcessing::Absent, ResponseProcessing::template),
    };
    item
}

fn declaration(
    cardinality: Cardinality,
    base_type: BaseType,
    correct: &[&str],
) -> ResponseDeclaration {
    let mut declaration = ResponseDeclaration::new(RESPONSE, cardinality, base_type);
    declaration.correct_response = correct.iter().map(|v| v.to_string()).collect();
    declaration
}

fn entry(key: &str, value: f64) -> MapEntry {
    MapEntry {
        key: key.into(),
        value,
        case_sensitive: true,
        extra: Vec::new(),
    }
}

fn options() -> Vec<SimpleChoice> {
    vec![
        SimpleChoice::new("A", "Option A"),
        SimpleChoice::new("B", "Option B"),
        SimpleChoice::new("C", "Option C"),
    ]
}

fn choice(max_choices: u32) -> ChoiceInteraction {
    ChoiceInteraction {
        response_identifier: RESPONSE.into(),
        shuffle: false,
        max_choices,
        min_choices: 0,
        prompt: Some(vec![ContentNode::text("Choose the correct answer.")]),
        choices: options(),
        extra: Vec::new(),
    }
}

fn hottext(identifier: &str, text: &str) -> ContentNode {
    ContentNode::Hottext {
        identifier: identifier.into(),
        children: vec![ContentNode::text(text)],
    }
}
