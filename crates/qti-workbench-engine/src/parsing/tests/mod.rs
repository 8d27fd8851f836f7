//! Tests for the parsing module.
//!
//! Every parse is also run through [`invariants::check`].


use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::model::{
    BaseType, Cardinality, ContentNode, Format, HottextInteraction, Interaction, ItemDocument,
    ResponseProcessing, SpecVersion, TemplateKind, TextEntryInteraction, UnknownNode,
    UnsupportedElement, Warning,
};
use crate::parsing::{ParseOutput, parse};

fn checked(source: &str, format: Format) -> ParseOutput {
    let output = parse(source, format);
    invariants::check(source, format, &output);
    output
}

fn single(source: &str, format: Format) -> ItemDocument {
    let output = checked(source, format);
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert_eq!(output.items.len(), 1);
    output.items.into_iter().next().unwrap()
}

fn markup_item(body: &str) -> String {
    format!(
        r#"<assessmentItem identifier="q">
  <responseDeclaration identifier="R" cardinality="single" baseType="float"/>
  <itemBody>{body}</itemBody>
</assessmentItem>"#
    )
}

const CHOICE_V2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<assessmentItem xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1" identifier="capital-fr" title="Capital of France" adaptive="false">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
    <correctResponse>
      <value>B</value>
    </correctResponse>
  </responseDeclaration>
  <outcomeDeclaration identifier="SCORE" cardinality="single" baseType="float"/>
  <itemBody>
    <p>Which city is the capital of France?</p>
    <choiceInteraction responseIdentifier="RESPONSE" shuffle="true" maxChoices="1">
      <prompt>Pick one.</prompt>
      <simpleChoice identifier="A">Lyon</simpleChoice>
      <simpleChoice identifier="B">Paris</simpleChoice>
      <simpleChoice identifier="C" fixed="true">Marseille &amp; Nice</simpleChoice>
    </choiceInteraction>
  </itemBody>
  <responseProcessing template="http://www.imsglobal.org/question/qti_v2p1/rptemplates/match_correct"/>
</assessmentItem>
"#;

#[test]
fn choice_item_v2() {
    let item = single(CHOICE_V2, Format::Markup);

    assert_eq!(item.id, "capital-fr");
    assert_eq!(item.title.as_deref(), Some("Capital of France"));
    assert_eq!(item.spec_version, SpecVersion::V2_1);
    assert_eq!(item.format, Format::Markup);
    assert!(item.warnings.is_empty(), "{:?}", item.warnings);
    assert!(item.unsupported_elements.is_empty());

    let declaration = item.primary_declaration().unwrap();
    assert_eq!(declaration.identifier, "RESPONSE");
    assert_eq!(declaration.cardinality, Cardinality::Single);
    assert_eq!(declaration.base_type, BaseType::Identifier);
    assert_eq!(declaration.correct_response, vec!["B"]);

    assert_eq!(item.outcome_declarations.len(), 1);
    assert_eq!(item.outcome_declarations[0].identifier, "SCORE");

    assert_eq!(item.body.len(), 2);
    assert_eq!(
        item.body[0],
        ContentNode::element("p", vec![ContentNode::text("Which city is the capital of France?")])
    );
    let ContentNode::Interaction(Interaction::Choice(choice)) = &item.body[1] else {
        panic!("expected a choice interaction, got {:?}", item.body[1]);
    };
    assert!(choice.shuffle);
    assert_eq!(choice.max_choices, 1);
    assert_eq!(choice.min_choices, 0);
    assert_eq!(choice.prompt, Some(vec![ContentNode::text("Pick one.")]));
    let texts: Vec<_> = choice
        .choices
        .iter()
        .map(|c| (c.identifier.as_str(), c.text(), c.fixed))
        .collect();
    assert_eq!(
        texts,
        vec![
            ("A", "Lyon".to_string(), false),
            ("B", "Paris".to_string(), false),
            ("C", "Marseille & Nice".to_string(), true),
        ]
    );

    assert!(matches!(
        item.response_processing,
        ResponseProcessing::Template {
            kind: TemplateKind::MatchCorrect,
            ..
        }
    ));
}

#[test]
fn text_entry_item_v3() {
    let source = r#"<qti-assessment-item identifier="te1" title="Sum">
  <qti-response-declaration identifier="RESPONSE" cardinality="single" base-type="integer">
    <qti-correct-response><qti-value>4</qti-value></qti-correct-response>
  </qti-response-declaration>
  <qti-item-body>
    <p>2 + 2 = <qti-text-entry-interaction response-identifier="RESPONSE" expected-length="2"/></p>
  </qti-item-body>
  <qti-response-processing template="https://purl.imsglobal.org/spec/qti/v3p0/rptemplates/match_correct.xml"/>
</qti-assessment-item>"#;
    let item = single(source, Format::Markup);

    assert_eq!(item.spec_version, SpecVersion::V3_0);
    assert_eq!(item.primary_declaration().unwrap().base_type, BaseType::Integer);
    assert_eq!(item.primary_declaration().unwrap().correct_response, vec!["4"]);
    assert_eq!(
        item.body,
        vec![ContentNode::element(
            "p",
            vec![
                ContentNode::text("2 + 2 = "),
                ContentNode::Interaction(Interaction::TextEntry(TextEntryInteraction {
                    response_identifier: "RESPONSE".into(),
                    expected_length: Some(2),
                    pattern_mask: None,
                    placeholder_text: None,
                    extra: Vec::new(),
                })),
            ]
        )]
    );
    assert!(item.warnings.is_empty(), "{:?}", item.warnings);
}

#[test]
fn other_version_spelling_is_unknown() {
    let source = r#"<qti-assessment-item identifier="x"><qti-item-body><choiceInteraction responseIdentifier="R"/></qti-item-body></qti-assessment-item>"#;
    let item = single(source, Format::Markup);

    assert_eq!(
        item.body,
        vec![ContentNode::Interaction(Interaction::Unknown(UnknownNode {
            tag: "choiceInteraction".into(),
            raw: r#"<choiceInteraction responseIdentifier="R"/>"#.into(),
        }))]
    );
    assert_eq!(item.unsupported_elements.len(), 1);
    assert_eq!(item.unsupported_elements[0].kind, "choiceInteraction");
}

#[test]
fn repeated_unknown_tag_is_tallied_once() {
    let source = r#"<assessmentItem identifier="u"><itemBody><customThing/><p><customThing>x</customThing></p><customThing/></itemBody></assessmentItem>"#;
    let output = checked(source, Format::Markup);

    assert_eq!(
        output.unsupported,
        vec![UnsupportedElement {
            kind: "customThing".into(),
            count: 3,
            description: "<customThing> is outside the 2.1 content vocabulary; kept verbatim"
                .into(),
        }]
    );

    let item = &output.items[0];
    assert_eq!(
        item.body[1],
        ContentNode::element(
            "p",
            vec![ContentNode::Unknown(UnknownNode {
                tag: "customThing".into(),
                raw: "<customThing>x</customThing>".into(),
            })]
        )
    );
}

#[rstest]
#[case::max_choices(r#"<choiceInteraction responseIdentifier="R" maxChoices="0"/>"#, "single")]
#[case::declaration(r#"<choiceInteraction responseIdentifier="R"/>"#, "multiple")]
fn multiple_response_classification(#[case] interaction: &str, #[case] cardinality: &str) {
    let source = format!(
        r#"<assessmentItem identifier="m">
  <responseDeclaration identifier="R" cardinality="{cardinality}" baseType="identifier"/>
  <itemBody>{interaction}</itemBody>
</assessmentItem>"#
    );
    let item = single(&source, Format::Markup);
    assert!(matches!(
        item.body[0],
        ContentNode::Interaction(Interaction::MultipleResponse(_))
    ));
}

#[test]
fn single_choice_stays_choice() {
    let item = single(
        &markup_item(r#"<choiceInteraction responseIdentifier="R" maxChoices="1"/>"#),
        Format::Markup,
    );
    assert!(matches!(
        item.body[0],
        ContentNode::Interaction(Interaction::Choice(_))
    ));
}

#[test]
fn dangling_response_identifier_warns() {
    let item = single(
        &markup_item(r#"<textEntryInteraction responseIdentifier="NOPE"/>"#),
        Format::Markup,
    );
    assert_eq!(
        item.warnings,
        vec![Warning::DanglingResponseIdentifier {
            interaction: "textEntryInteraction".into(),
            response_identifier: "NOPE".into(),
        }]
    );
}

#[test]
fn missing_response_identifier_warns() {
    let item = single(&markup_item("<extendedTextInteraction/>"), Format::Markup);
    assert_eq!(
        item.warnings,
        vec![Warning::MissingResponseIdentifier {
            interaction: "extendedTextInteraction".into(),
        }]
    );
}

#[test]
fn non_numeric_attributes_default_with_warnings() {
    let item = single(
        &markup_item(
            r#"<sliderInteraction responseIdentifier="R" lowerBound="0" upperBound="ten" step="x"/>"#,
        ),
        Format::Markup,
    );
    let ContentNode::Interaction(Interaction::Slider(slider)) = &item.body[0] else {
        panic!("expected a slider, got {:?}", item.body[0]);
    };
    assert_eq!(slider.lower_bound, 0.0);
    assert_eq!(slider.upper_bound, 100.0);
    assert_eq!(slider.step, 1.0);
    assert_eq!(
        item.warnings,
        vec![
            Warning::DefaultedNumber {
                element: "sliderInteraction".into(),
                attribute: "upperBound".into(),
                value: "ten".into(),
                default: "100".into(),
            },
            Warning::DefaultedNumber {
                element: "sliderInteraction".into(),
                attribute: "step".into(),
                value: "x".into(),
                default: "1".into(),
            },
        ]
    );
}

#[test]
fn unknown_cardinality_defaults_with_warning() {
    let source = r#"<assessmentItem identifier="k">
  <responseDeclaration identifier="R" cardinality="several" baseType="identifier"/>
</assessmentItem>"#;
    let item = single(source, Format::Markup);
    assert_eq!(item.response_declarations[0].cardinality, Cardinality::Single);
    assert_eq!(
        item.warnings,
        vec![Warning::DefaultedKeyword {
            element: "responseDeclaration".into(),
            attribute: "cardinality".into(),
            value: "several".into(),
            default: "single".into(),
        }]
    );
}

#[test]
fn surplus_correct_values_and_duplicates_warn() {
    let source = r#"<assessmentItem identifier="d">
  <responseDeclaration identifier="R" cardinality="single" baseType="identifier">
    <correctResponse><value>A</value><value>B</value></correctResponse>
  </responseDeclaration>
  <responseDeclaration identifier="R" cardinality="single" baseType="identifier"/>
</assessmentItem>"#;
    let item = single(source, Format::Markup);
    assert_eq!(
        item.warnings,
        vec![
            Warning::TooManyCorrectValues {
                identifier: "R".into(),
                count: 2,
            },
            Warning::DuplicateDeclaration {
                identifier: "R".into(),
            },
        ]
    );
}

#[test]
fn hottext_interaction_content() {
    let item = single(
        &markup_item(
            r#"<hottextInteraction responseIdentifier="R" maxChoices="1"><prompt>Find</prompt><p>The <hottext identifier="H1">quick</hottext> fox</p></hottextInteraction>"#,
        ),
        Format::Markup,
    );
    assert_eq!(
        item.body,
        vec![ContentNode::Interaction(Interaction::Hottext(
            HottextInteraction {
                response_identifier: "R".into(),
                max_choices: 1,
                prompt: Some(vec![ContentNode::text("Find")]),
                content: vec![ContentNode::element(
                    "p",
                    vec![
                        ContentNode::text("The "),
                        ContentNode::Hottext {
                            identifier: "H1".into(),
                            children: vec![ContentNode::text("quick")],
                        },
                        ContentNode::text(" fox"),
                    ]
                )],
                extra: Vec::new(),
            }
        ))]
    );
}

#[test]
fn entities_and_cdata_are_decoded() {
    let item = single(
        &markup_item(r#"<p title="a &amp; b">x &lt; y <![CDATA[& z]]></p>"#),
        Format::Markup,
    );
    assert_eq!(
        item.body,
        vec![ContentNode::Element {
            tag: "p".into(),
            attributes: vec![("title".into(), "a & b".into())],
            children: vec![ContentNode::text("x < y & z")],
        }]
    );
}

#[test]
fn response_processing_variants() {
    let custom = r#"<responseProcessing><responseCondition/></responseProcessing>"#;
    let source = format!(r#"<assessmentItem identifier="c">{custom}</assessmentItem>"#);
    let item = single(&source, Format::Markup);
    assert_eq!(
        item.response_processing,
        ResponseProcessing::Custom { raw: custom.into() }
    );

    let item = single(r#"<assessmentItem identifier="a"/>"#, Format::Markup);
    assert_eq!(item.response_processing, ResponseProcessing::Absent);
}

#[test]
fn unknown_item_sections_are_kept() {
    let feedback = r#"<modalFeedback outcomeIdentifier="FB" identifier="x">Hi</modalFeedback>"#;
    let source = format!(r#"<assessmentItem identifier="f">{feedback}</assessmentItem>"#);
    let item = single(&source, Format::Markup);
    assert_eq!(
        item.unknown_sections,
        vec![UnknownNode {
            tag: "modalFeedback".into(),
            raw: feedback.into(),
        }]
    );
    assert_eq!(item.unsupported_elements[0].kind, "modalFeedback");
}

#[test]
fn items_inside_wrappers() {
    let source = r#"<assessmentTest identifier="t">
  <testPart identifier="p">
    <assessmentSection identifier="s">
      <assessmentItem identifier="a"/>
      <assessmentItem identifier="b"/>
    </assessmentSection>
  </testPart>
  <timeLimits maxTime="60"/>
</assessmentTest>"#;
    let output = checked(source, Format::Markup);
    let ids: Vec<_> = output.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(output.unsupported.len(), 1);
    assert_eq!(output.unsupported[0].kind, "timeLimits");
}

#[test]
fn several_bare_roots_and_unknown_root() {
    let bare = r#"<assessmentItem identifier="a"/><assessmentItem identifier="b"/>"#;
    assert_eq!(checked(bare, Format::Markup).items.len(), 2);

    let bundle = r#"<bundle><assessmentItem identifier="a"/></bundle>"#;
    let output = checked(bundle, Format::Markup);
    assert_eq!(output.items.len(), 1);
    assert!(output.unsupported.is_empty());
}

#[test]
fn broken_item_is_skipped_and_siblings_survive() {
    let source = r#"<assessmentTest identifier="t">
<assessmentItem identifier="good"/>
<assessmentItem identifier="bad"><itemBody><p>oops</itemBody></assessmentItem>
</assessmentTest>"#;
    let output = checked(source, Format::Markup);
    let ids: Vec<_> = output.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["good"]);
    assert!(!output.errors.is_empty());
}

#[test]
fn json_single_item() {
    let source = r#"{
  "type": "assessmentItem",
  "identifier": "capital-fr",
  "responseDeclarations": [
    {"identifier": "RESPONSE", "cardinality": "single", "baseType": "identifier", "correctResponse": ["B"]}
  ],
  "itemBody": [
    {"type": "p", "attributes": {"class": "lead"}, "children": ["Which city?"]},
    {
      "type": "choiceInteraction",
      "responseIdentifier": "RESPONSE",
      "maxChoices": 1,
      "choices": [
        {"identifier": "A", "content": ["Lyon"]},
        {"identifier": "B", "content": ["Paris é"]}
      ]
    }
  ],
  "responseProcessing": {"template": "match_correct"}
}"#;
    let item = single(source, Format::StructuredObject);

    assert_eq!(item.id, "capital-fr");
    assert_eq!(item.spec_version, SpecVersion::V3_0);
    assert_eq!(item.format, Format::StructuredObject);
    assert_eq!(item.primary_declaration().unwrap().correct_response, vec!["B"]);
    assert_eq!(
        item.body[0],
        ContentNode::Element {
            tag: "p".into(),
            attributes: vec![("class".into(), "lead".into())],
            children: vec![ContentNode::text("Which city?")],
        }
    );
    let ContentNode::Interaction(Interaction::Choice(choice)) = &item.body[1] else {
        panic!("expected a choice, got {:?}", item.body[1]);
    };
    assert_eq!(choice.choices[1].text(), "Paris é");
    assert!(matches!(
        item.response_processing,
        ResponseProcessing::Template {
            kind: TemplateKind::MatchCorrect,
            ..
        }
    ));
    assert!(item.warnings.is_empty(), "{:?}", item.warnings);
}

#[test]
fn json_array_with_non_object_item() {
    let source = r#"[{"identifier": "a"}, 3, {"identifier": "b"}]"#;
    let output = checked(source, Format::StructuredObject);
    let ids: Vec<_> = output.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].message, "item must be an object");
    assert_eq!(&source[output.errors[0].range.clone()], "3");
}

#[test]
fn json_test_object() {
    let source = r#"{"type": "assessmentTest", "identifier": "t", "items": [{"identifier": "a"}], "timeLimits": {}}"#;
    let output = checked(source, Format::StructuredObject);
    assert_eq!(output.items.len(), 1);
    assert_eq!(output.unsupported[0].kind, "timeLimits");
}

#[test]
fn json_broken_item_is_skipped() {
    let source = r#"[{"identifier": "a",}, {"identifier": "b"}]"#;
    let output = checked(source, Format::StructuredObject);
    let ids: Vec<_> = output.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
    assert_eq!(output.errors.len(), 1);
}

#[test]
fn json_unknown_fields_and_nodes() {
    let source = r#"{
  "identifier": "u",
  "stylesheet": {"href": "a.css"},
  "itemBody": [{"type": "mediaInteraction", "responseIdentifier": "R"}, {"type": "marquee"}, 7]
}"#;
    let item = single(source, Format::StructuredObject);
    assert_eq!(
        item.unknown_sections,
        vec![UnknownNode {
            tag: "stylesheet".into(),
            raw: r#"{"href": "a.css"}"#.into(),
        }]
    );
    assert!(matches!(
        &item.body[0],
        ContentNode::Interaction(Interaction::Unknown(u)) if u.tag == "mediaInteraction"
    ));
    assert!(matches!(&item.body[1], ContentNode::Unknown(u) if u.tag == "marquee"));
    assert!(matches!(&item.body[2], ContentNode::Unknown(u) if u.raw == "7"));
    let kinds: Vec<_> = item
        .unsupported_elements
        .iter()
        .map(|u| u.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["mediaInteraction", "marquee", "value", "stylesheet"]);
}

#[test]
fn json_mapping_and_outcomes() {
    let source = r#"{
  "identifier": "m",
  "responseDeclarations": [{
    "identifier": "RESPONSE", "cardinality": "multiple", "baseType": "identifier",
    "mapping": {"defaultValue": -1, "upperBound": 2, "entries": [{"key": "A", "value": 1}, {"key": "B", "value": 1.5, "caseSensitive": false}]}
  }],
  "outcomeDeclarations": [{"identifier": "MAXSCORE", "baseType": "float", "defaultValue": 2}],
  "responseProcessing": "https://purl.imsglobal.org/spec/qti/v3p0/rptemplates/map_response.xml"
}"#;
    let item = single(source, Format::StructuredObject);
    let mapping = item.response_declarations[0].mapping.as_ref().unwrap();
    assert_eq!(mapping.default_value, -1.0);
    assert_eq!(mapping.upper_bound, Some(2.0));
    assert_eq!(mapping.lower_bound, None);
    assert_eq!(mapping.entries.len(), 2);
    assert!(mapping.entries[0].case_sensitive);
    assert!(!mapping.entries[1].case_sensitive);
    assert_eq!(item.outcome("MAXSCORE").unwrap().default_value.as_deref(), Some("2"));
    assert!(matches!(
        item.response_processing,
        ResponseProcessing::Template {
            kind: TemplateKind::MapResponse,
            ..
        }
    ));
}

#[test]
fn empty_documents() {
    for format in [Format::Markup, Format::StructuredObject] {
        let output = checked("  \n", format);
        assert!(output.items.is_empty());
        assert!(output.errors.is_empty());
    }
}

#[rstest]
#[case("<assessmentItem")]
#[case("<assessmentItem identifier=\"a\"><itemBody><p></itemBody>")]
#[case("<<<>>>&&&</x></y>")]
#[case("<!-- <assessmentItem identifier=\"a\"/>")]
#[case("<a b=c d='e' f>text</a></a>")]
#[case("<qti-assessment-item identifier=\"é\"><qti-item-body>ü</qti-item-body>")]
fn garbage_markup_never_panics(#[case] source: &str) {
    checked(source, Format::Markup);
}

#[rstest]
#[case("{")]
#[case("[1, 2,")]
#[case(r#"{"identifier": "a" "itemBody": []}"#)]
#[case(r#"{"identifier": "\q"}"#)]
#[case("null")]
#[case(r#"{"items": 4}"#)]
#[case("]]]}}}")]
fn garbage_objects_never_panic(#[case] source: &str) {
    checked(source, Format::StructuredObject);
}
