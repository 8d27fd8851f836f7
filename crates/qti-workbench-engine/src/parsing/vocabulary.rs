//! Element and attribute names the parser recognises.
//!
//! Names are held in their camelCase form (`choiceInteraction`,
//! `responseIdentifier`). The 3.0 vocabulary spells the same names in
//! kebab-case, with a `qti-` prefix on elements (`qti-choice-interaction`,
//! `response-identifier`). Static content elements (`p`, `img`, ...) are
//! spelled the same in both versions.

use crate::model::SpecVersion;

pub(crate) const ITEM: &str = "assessmentItem";
pub(crate) const TEST: &str = "assessmentTest";

/// Containers whose descendants may be items.
pub(crate) const WRAPPERS: &[&str] = &[TEST, "testPart", "assessmentSection"];

pub(crate) const RESPONSE_DECLARATION: &str = "responseDeclaration";
pub(crate) const OUTCOME_DECLARATION: &str = "outcomeDeclaration";
pub(crate) const ITEM_BODY: &str = "itemBody";
pub(crate) const RESPONSE_PROCESSING: &str = "responseProcessing";
pub(crate) const CORRECT_RESPONSE: &str = "correctResponse";
pub(crate) const VALUE: &str = "value";

pub(crate) const CHOICE: &str = "choiceInteraction";
pub(crate) const TEXT_ENTRY: &str = "textEntryInteraction";
pub(crate) const EXTENDED_TEXT: &str = "extendedTextInteraction";
pub(crate) const HOTTEXT_INTERACTION: &str = "hottextInteraction";
pub(crate) const SLIDER: &str = "sliderInteraction";
pub(crate) const ORDER: &str = "orderInteraction";
pub(crate) const HOTTEXT: &str = "hottext";

/// Static content elements carried through as [`ContentNode::Element`].
///
/// [`ContentNode::Element`]: crate::model::ContentNode::Element
const XHTML: &[&str] = &[
    "a", "abbr", "address", "audio", "b", "bdo", "big", "blockquote", "br", "caption", "cite",
    "code", "col", "colgroup", "dd", "dfn", "div", "dl", "dt", "em", "figcaption", "figure", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "kbd", "li", "object", "ol", "p", "param",
    "pre", "q", "samp", "small", "source", "span", "strong", "sub", "sup", "table", "tbody", "td",
    "tfoot", "th", "thead", "tr", "track", "tt", "ul", "var", "video",
];

pub(crate) fn is_xhtml(tag: &str) -> bool {
    XHTML.contains(&tag)
}

/// True for any name shaped like an interaction, known or not.
pub(crate) fn looks_like_interaction(tag: &str) -> bool {
    tag.ends_with("Interaction") || tag.ends_with("-interaction")
}

/// Version implied by an item or test element name.
pub(crate) fn version_of(tag: &str) -> SpecVersion {
    if tag.starts_with("qti-") {
        SpecVersion::V3_0
    } else {
        SpecVersion::V2_1
    }
}

/// `choiceInteraction` → `choice-interaction`
pub(crate) fn kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `choice-interaction` → `choiceInteraction`
pub(crate) fn camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Spelling of a vocabulary element in `version`.
pub(crate) fn element_name(canonical: &str, version: SpecVersion) -> String {
    match version {
        SpecVersion::V2_1 => canonical.to_string(),
        SpecVersion::V3_0 => format!("qti-{}", kebab(canonical)),
    }
}

/// Spelling of a vocabulary attribute in `version`.
pub(crate) fn attribute_name(canonical: &str, version: SpecVersion) -> String {
    match version {
        SpecVersion::V2_1 => canonical.to_string(),
        SpecVersion::V3_0 => kebab(canonical),
    }
}

/// The camelCase name of a vocabulary element as written in `version`, or
/// `None` when the spelling belongs to the other version.
pub(crate) fn canonical_name(tag: &str, version: SpecVersion) -> Option<String> {
    match version {
        SpecVersion::V2_1 => (!tag.starts_with("qti-")).then(|| tag.to_string()),
        SpecVersion::V3_0 => tag.strip_prefix("qti-").map(camel),
    }
}
