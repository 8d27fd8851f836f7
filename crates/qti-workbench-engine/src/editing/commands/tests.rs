use pretty_assertions::assert_eq;
use rstest::rstest;

use super::{Edit, EditError, apply};
use crate::model::{BaseType, Format};
use crate::parsing::{locate, parse};

const BANK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- bank -->
<assessmentTest identifier="t">
  <assessmentItem identifier="q0">
    <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
      <correctResponse>
        <value>A</value>
      </correctResponse>
    </responseDeclaration>
    <itemBody>
      <choiceInteraction responseIdentifier="RESPONSE" maxChoices="1">
        <simpleChoice identifier="A">a</simpleChoice>
        <simpleChoice identifier="B">b</simpleChoice>
      </choiceInteraction>
    </itemBody>
  </assessmentItem>
  <assessmentItem identifier="q1">
    <responseDeclaration identifier="RESPONSE" cardinality="multiple" baseType="identifier"/>
    <itemBody><p>Second</p></itemBody>
  </assessmentItem>
  <assessmentItem identifier="q2"><itemBody><p>Third <odd x="1"/></p></itemBody></assessmentItem>
</assessmentTest>
"#;

const NEW_ITEM: &str = r#"<assessmentItem identifier="new"><itemBody><p>New</p></itemBody></assessmentItem>"#;

fn set(item_id: &str, values: &[&str]) -> Edit {
    Edit::SetCorrectResponse {
        item_id: item_id.to_string(),
        response_id: None,
        values: values.iter().map(|v| v.to_string()).collect(),
    }
}

fn insert(fragment: &str, at: usize) -> Edit {
    Edit::InsertItem {
        fragment: fragment.to_string(),
        at,
    }
}

fn ids(text: &str, format: Format) -> Vec<String> {
    let output = parse(text, format);
    assert!(output.errors.is_empty(), "{:?}\n{text}", output.errors);
    output.items.into_iter().map(|item| item.id).collect()
}

fn item_texts(text: &str, format: Format) -> Vec<String> {
    locate(text, format)
        .items
        .iter()
        .map(|item| text[item.range.clone()].to_string())
        .collect()
}

#[test]
fn set_correct_response_rewrites_values_only() {
    let applied = apply(BANK, Format::Markup, &set("q0", &["B"])).unwrap();
    assert_eq!(
        applied.text,
        BANK.replace("<value>A</value>", "<value>B</value>")
    );
    assert_eq!(applied.changed.len(), 1);

    let items = parse(&applied.text, Format::Markup).items;
    assert_eq!(items[0].response_declarations[0].correct_response, vec!["B"]);
}

#[test]
fn set_correct_response_opens_self_closing_declaration() {
    let applied = apply(BANK, Format::Markup, &set("q1", &["A", "B"])).unwrap();
    assert!(applied.text.contains(
        r#"    <responseDeclaration identifier="RESPONSE" cardinality="multiple" baseType="identifier">
      <correctResponse>
        <value>A</value>
        <value>B</value>
      </correctResponse>
    </responseDeclaration>
    <itemBody><p>Second</p></itemBody>"#
    ));

    let items = parse(&applied.text, Format::Markup).items;
    assert_eq!(items[1].response_declarations[0].correct_response, vec!["A", "B"]);
}

#[test]
fn set_correct_response_with_no_values_removes_block() {
    let applied = apply(BANK, Format::Markup, &set("q0", &[])).unwrap();
    assert!(applied.text.contains(
        "<responseDeclaration identifier=\"RESPONSE\" cardinality=\"single\" baseType=\"identifier\">\n    </responseDeclaration>"
    ));
    let items = parse(&applied.text, Format::Markup).items;
    assert!(items[0].response_declarations[0].correct_response.is_empty());

    // Nothing to remove is a no-op.
    let unchanged = apply(BANK, Format::Markup, &set("q1", &[])).unwrap();
    assert_eq!(unchanged.text, BANK);
    assert!(unchanged.changed.is_empty());
}

#[test]
fn set_correct_response_escapes_values() {
    let source = r#"<assessmentItem identifier="s">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="string">
    <correctResponse><value>x</value></correctResponse>
  </responseDeclaration>
</assessmentItem>"#;
    let applied = apply(source, Format::Markup, &set("s", &["a < b & c"])).unwrap();
    assert!(applied.text.contains("<value>a &lt; b &amp; c</value>"));
    let items = parse(&applied.text, Format::Markup).items;
    assert_eq!(items[0].response_declarations[0].correct_response, vec!["a < b & c"]);
}

#[test]
fn set_correct_response_in_version_three() {
    let source = r#"<qti-assessment-item identifier="v3">
  <qti-response-declaration identifier="RESPONSE" cardinality="single" base-type="integer">
  </qti-response-declaration>
</qti-assessment-item>"#;
    let applied = apply(source, Format::Markup, &set("v3", &["42"])).unwrap();
    assert!(applied.text.contains(
        "base-type=\"integer\">\n    <qti-correct-response>\n      <qti-value>42</qti-value>\n    </qti-correct-response>"
    ));
    let items = parse(&applied.text, Format::Markup).items;
    assert_eq!(items[0].response_declarations[0].correct_response, vec!["42"]);
}

#[rstest]
#[case(set("q0", &["A", "B"]), EditError::Cardinality { response: "RESPONSE".into(), count: 2 })]
#[case(set("q0", &["not an id"]), EditError::InvalidValue { value: "not an id".into(), base_type: BaseType::Identifier })]
#[case(set("zz", &["A"]), EditError::UnknownItem("zz".into()))]
#[case(set("q2", &["A"]), EditError::UnknownDeclaration { item: "q2".into(), response: "RESPONSE".into() })]
#[case(
    Edit::SetCorrectResponse { item_id: "q0".into(), response_id: Some("NOPE".into()), values: vec![] },
    EditError::UnknownDeclaration { item: "q0".into(), response: "NOPE".into() }
)]
fn set_correct_response_rejections(#[case] edit: Edit, #[case] expected: EditError) {
    assert_eq!(apply(BANK, Format::Markup, &edit), Err(expected));
}

#[test]
fn broken_item_cannot_be_edited() {
    let source = r#"<assessmentTest>
  <assessmentItem identifier="bad"><itemBody><p>oops</itemBody></assessmentItem>
</assessmentTest>"#;
    assert_eq!(
        apply(source, Format::Markup, &set("bad", &["A"])),
        Err(EditError::ItemNotModeled("bad".into()))
    );
}

#[test]
fn insert_item_in_the_middle_keeps_neighbours_intact() {
    let before = item_texts(BANK, Format::Markup);
    let applied = apply(BANK, Format::Markup, &insert(NEW_ITEM, 1)).unwrap();

    assert_eq!(ids(&applied.text, Format::Markup), ["q0", "new", "q1", "q2"]);
    let after = item_texts(&applied.text, Format::Markup);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1], NEW_ITEM);
    assert_eq!(&after[2..], &before[1..]);
    assert!(applied.text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- bank -->\n"));
    assert!(applied.text.contains(&format!("  {NEW_ITEM}\n  <assessmentItem identifier=\"q1\">")));
}

#[test]
fn insert_item_at_the_end() {
    let applied = apply(BANK, Format::Markup, &insert(NEW_ITEM, 3)).unwrap();
    assert_eq!(ids(&applied.text, Format::Markup), ["q0", "q1", "q2", "new"]);
    assert!(applied.text.ends_with(&format!("\n  {NEW_ITEM}\n</assessmentTest>\n")));
}

#[test]
fn insert_item_takes_only_the_item_from_a_fragment() {
    let fragment = format!("<?xml version=\"1.0\"?>\n<!-- generated -->\n{NEW_ITEM}\n");
    let applied = apply(BANK, Format::Markup, &insert(&fragment, 0)).unwrap();
    assert_eq!(ids(&applied.text, Format::Markup), ["new", "q0", "q1", "q2"]);
    assert!(!applied.text.contains("generated"));
}

#[rstest]
#[case(insert(NEW_ITEM, 4), EditError::IndexOutOfRange { index: 4, len: 3 })]
#[case(
    insert(&format!("<assessmentTest>{NEW_ITEM}{NEW_ITEM}</assessmentTest>"), 0),
    EditError::InvalidFragment("expected exactly one item, found 2".into())
)]
#[case(insert("<p>not an item</p>", 0), EditError::InvalidFragment("expected exactly one item, found 0".into()))]
fn insert_item_rejections(#[case] edit: Edit, #[case] expected: EditError) {
    assert_eq!(apply(BANK, Format::Markup, &edit), Err(expected));
}

#[test]
fn insert_item_rejects_broken_fragment() {
    let result = apply(BANK, Format::Markup, &insert("<assessmentItem identifier=\"x\">", 0));
    assert!(matches!(result, Err(EditError::InvalidFragment(message)) if message.contains("syntax error")));
}

#[test]
fn insert_item_into_empty_wrapper_and_empty_document() {
    let wrapper = "<assessmentTest identifier=\"t\">\n</assessmentTest>\n";
    let applied = apply(wrapper, Format::Markup, &insert(NEW_ITEM, 0)).unwrap();
    assert_eq!(
        applied.text,
        format!("<assessmentTest identifier=\"t\">\n  {NEW_ITEM}\n</assessmentTest>\n")
    );

    let applied = apply("  \n", Format::Markup, &insert(NEW_ITEM, 0)).unwrap();
    assert_eq!(applied.text, format!("{NEW_ITEM}\n"));

    let declaration_only = "<?xml version=\"1.0\"?>";
    let applied = apply(declaration_only, Format::Markup, &insert(NEW_ITEM, 0)).unwrap();
    assert_eq!(ids(&applied.text, Format::Markup), ["new"]);
}

#[test]
fn reorder_items_moves_whole_fragments() {
    let before = item_texts(BANK, Format::Markup);
    let edit = Edit::ReorderItems {
        order: vec![2, 0, 1],
    };
    let applied = apply(BANK, Format::Markup, &edit).unwrap();
    assert_eq!(ids(&applied.text, Format::Markup), ["q2", "q0", "q1"]);
    assert_eq!(
        item_texts(&applied.text, Format::Markup),
        vec![before[2].clone(), before[0].clone(), before[1].clone()]
    );

    let identity = Edit::ReorderItems {
        order: vec![0, 1, 2],
    };
    assert_eq!(apply(BANK, Format::Markup, &identity).unwrap().text, BANK);
}

#[rstest]
#[case(vec![0, 1], "expected 3 position(s), got 2")]
#[case(vec![0, 0, 1], "0 appears twice")]
#[case(vec![0, 1, 3], "3 is out of range")]
fn reorder_rejections(#[case] order: Vec<usize>, #[case] message: &str) {
    assert_eq!(
        apply(BANK, Format::Markup, &Edit::ReorderItems { order }),
        Err(EditError::InvalidOrder(message.into()))
    );
}

#[test]
fn replace_whole_never_breaks_a_clean_document() {
    let broken = Edit::ReplaceWhole {
        text: "<assessmentItem identifier=\"x\">".into(),
    };
    assert_eq!(
        apply(BANK, Format::Markup, &broken),
        Err(EditError::WouldIntroduceErrors(1))
    );

    let fine = Edit::ReplaceWhole {
        text: NEW_ITEM.into(),
    };
    let applied = apply(BANK, Format::Markup, &fine).unwrap();
    assert_eq!(applied.text, NEW_ITEM);
    assert_eq!(applied.changed, vec![0..NEW_ITEM.len()]);

    // A document that already has errors may be replaced by anything no worse.
    let applied = apply("<a>", Format::Markup, &broken).unwrap();
    assert_eq!(applied.text, "<assessmentItem identifier=\"x\">");
}

const ARRAY: &str = r#"[
  {
    "type": "assessmentItem",
    "identifier": "j0",
    "responseDeclarations": [
      {"identifier": "RESPONSE", "cardinality": "single", "baseType": "identifier", "correctResponse": ["A"]}
    ],
    "itemBody": ["Pick"]
  },
  {
    "identifier": "j1",
    "responseDeclarations": [
      {
        "identifier": "RESPONSE",
        "cardinality": "multiple",
        "baseType": "string"
      }
    ],
    "itemBody": []
  }
]
"#;

const NEW_OBJECT: &str = r#"{"identifier": "new", "itemBody": ["New"]}"#;

#[test]
fn object_set_correct_response() {
    let applied = apply(ARRAY, Format::StructuredObject, &set("j0", &["B"])).unwrap();
    assert_eq!(applied.text, ARRAY.replace(r#"["A"]"#, r#"["B"]"#));

    let applied = apply(
        ARRAY,
        Format::StructuredObject,
        &set("j1", &["x", "say \"hi\""]),
    )
    .unwrap();
    assert!(applied.text.contains(
        "\"baseType\": \"string\",\n        \"correctResponse\": [\"x\", \"say \\\"hi\\\"\"]\n"
    ));
    let items = parse(&applied.text, Format::StructuredObject).items;
    assert_eq!(
        items[1].response_declarations[0].correct_response,
        vec!["x", "say \"hi\""]
    );

    let applied = apply(ARRAY, Format::StructuredObject, &set("j0", &[])).unwrap();
    assert!(applied.text.contains(r#""baseType": "identifier"}"#));
    let items = parse(&applied.text, Format::StructuredObject).items;
    assert!(items[0].response_declarations[0].correct_response.is_empty());
}

#[test]
fn object_insert_and_reorder() {
    let applied = apply(ARRAY, Format::StructuredObject, &insert(NEW_OBJECT, 1)).unwrap();
    assert_eq!(ids(&applied.text, Format::StructuredObject), ["j0", "new", "j1"]);
    assert!(applied.text.contains(&format!("  {NEW_OBJECT},\n  {{\n    \"identifier\": \"j1\"")));

    let applied = apply(ARRAY, Format::StructuredObject, &insert(NEW_OBJECT, 2)).unwrap();
    assert_eq!(ids(&applied.text, Format::StructuredObject), ["j0", "j1", "new"]);

    let reorder = Edit::ReorderItems { order: vec![1, 0] };
    let applied = apply(ARRAY, Format::StructuredObject, &reorder).unwrap();
    assert_eq!(ids(&applied.text, Format::StructuredObject), ["j1", "j0"]);
}

#[rstest]
#[case(0, &["new", "solo"])]
#[case(1, &["solo", "new"])]
fn object_insert_wraps_a_single_item(#[case] at: usize, #[case] expected: &[&str]) {
    let single = r#"{"identifier": "solo", "itemBody": []}"#;
    let applied = apply(single, Format::StructuredObject, &insert(NEW_OBJECT, at)).unwrap();
    assert!(applied.text.starts_with("[\n"));
    assert_eq!(ids(&applied.text, Format::StructuredObject), expected);
}

#[test]
fn object_insert_into_empty_containers() {
    let applied = apply("[]", Format::StructuredObject, &insert(NEW_OBJECT, 0)).unwrap();
    assert_eq!(applied.text, format!("[\n  {NEW_OBJECT}\n]"));

    let applied = apply("", Format::StructuredObject, &insert(NEW_OBJECT, 0)).unwrap();
    assert_eq!(applied.text, format!("{NEW_OBJECT}\n"));

    let test = r#"{"type": "assessmentTest", "items": []}"#;
    let applied = apply(test, Format::StructuredObject, &insert(NEW_OBJECT, 0)).unwrap();
    assert_eq!(ids(&applied.text, Format::StructuredObject), ["new"]);

    assert_eq!(
        apply("42", Format::StructuredObject, &insert(NEW_OBJECT, 0)),
        Err(EditError::NotAContainer)
    );
}
