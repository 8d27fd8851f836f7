//! Item body content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A fragment kept exactly as it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownNode {
    /// Element name, object `type` or field name, as written.
    pub tag: String,
    /// Source text of the whole fragment.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ContentNode {
    /// Character data with entities decoded.
    Text { text: String },
    /// A static content element (`p`, `img`, `table`, ...).
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<ContentNode>,
    },
    Interaction(Interaction),
    /// A selectable run of text inside a hottext interaction.
    Hottext {
        identifier: String,
        children: Vec<ContentNode>,
    },
    Unknown(UnknownNode),
}

impl ContentNode {
    pub fn text(text: impl Into<String>) -> Self {
        ContentNode::Text { text: text.into() }
    }

    pub fn element(tag: impl Into<String>, children: Vec<ContentNode>) -> Self {
        ContentNode::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children,
        }
    }
}

/// Concatenated text of a content list, markup stripped.
pub fn plain_text(nodes: &[ContentNode]) -> String {
    let mut out = String::new();
    push_text(nodes, &mut out);
    out
}

fn push_text(nodes: &[ContentNode], out: &mut String) {
    for node in nodes {
        match node {
            ContentNode::Text { text } => out.push_str(text),
            ContentNode::Element { children, .. } | ContentNode::Hottext { children, .. } => {
                push_text(children, out)
            }
            ContentNode::Interaction(_) | ContentNode::Unknown(_) => {}
        }
    }
}

pub(crate) fn collect_interactions<'a>(
    nodes: &'a [ContentNode],
    found: &mut Vec<&'a Interaction>,
) {
    for node in nodes {
        match node {
            ContentNode::Interaction(interaction) => {
                found.push(interaction);
                if let Interaction::Hottext(h) = interaction {
                    collect_interactions(&h.content, found);
                }
            }
            ContentNode::Element { children, .. } | ContentNode::Hottext { children, .. } => {
                collect_interactions(children, found)
            }
            ContentNode::Text { .. } | ContentNode::Unknown(_) => {}
        }
    }
}

/// The interaction kinds the engine understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
    Choice(ChoiceInteraction),
    /// A choice interaction that accepts several selections.
    MultipleResponse(ChoiceInteraction),
    TextEntry(TextEntryInteraction),
    ExtendedText(ExtendedTextInteraction),
    Hottext(HottextInteraction),
    Slider(SliderInteraction),
    Order(OrderInteraction),
    /// An interaction outside the vocabulary, kept verbatim.
    Unknown(UnknownNode),
}

impl Interaction {
    pub fn kind(&self) -> Option<InteractionKind> {
        Some(match self {
            Interaction::Choice(_) => InteractionKind::Choice,
            Interaction::MultipleResponse(_) => InteractionKind::MultipleResponse,
            Interaction::TextEntry(_) => InteractionKind::TextEntry,
            Interaction::ExtendedText(_) => InteractionKind::ExtendedText,
            Interaction::Hottext(_) => InteractionKind::Hottext,
            Interaction::Slider(_) => InteractionKind::Slider,
            Interaction::Order(_) => InteractionKind::Order,
            Interaction::Unknown(_) => return None,
        })
    }

    /// The declaration this interaction collects a response for.
    pub fn response_identifier(&self) -> Option<&str> {
        let id = match self {
            Interaction::Choice(c) | Interaction::MultipleResponse(c) => &c.response_identifier,
            Interaction::TextEntry(t) => &t.response_identifier,
            Interaction::ExtendedText(e) => &e.response_identifier,
            Interaction::Hottext(h) => &h.response_identifier,
            Interaction::Slider(s) => &s.response_identifier,
            Interaction::Order(o) => &o.response_identifier,
            Interaction::Unknown(_) => return None,
        };
        Some(id.as_str())
    }

    /// Element name of the interaction in the camelCase vocabulary.
    pub fn tag(&self) -> &str {
        match self {
            Interaction::Choice(_) | Interaction::MultipleResponse(_) => "choiceInteraction",
            Interaction::TextEntry(_) => "textEntryInteraction",
            Interaction::ExtendedText(_) => "extendedTextInteraction",
            Interaction::Hottext(_) => "hottextInteraction",
            Interaction::Slider(_) => "sliderInteraction",
            Interaction::Order(_) => "orderInteraction",
            Interaction::Unknown(u) => &u.tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleChoice {
    pub identifier: String,
    pub fixed: bool,
    pub content: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

impl SimpleChoice {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            fixed: false,
            content: vec![ContentNode::text(text)],
            extra: Vec::new(),
        }
    }

    /// The choice's text with markup stripped.
    pub fn text(&self) -> String {
        plain_text(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceInteraction {
    pub response_identifier: String,
    pub shuffle: bool,
    /// 0 means unlimited.
    pub max_choices: u32,
    pub min_choices: u32,
    pub prompt: Option<Vec<ContentNode>>,
    pub choices: Vec<SimpleChoice>,
    /// Children or fields outside the vocabulary, kept verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntryInteraction {
    pub response_identifier: String,
    pub expected_length: Option<u32>,
    pub pattern_mask: Option<String>,
    pub placeholder_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedTextInteraction {
    pub response_identifier: String,
    pub expected_lines: Option<u32>,
    pub expected_length: Option<u32>,
    pub prompt: Option<Vec<ContentNode>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HottextInteraction {
    pub response_identifier: String,
    pub max_choices: u32,
    pub prompt: Option<Vec<ContentNode>>,
    /// Body content with [`ContentNode::Hottext`] runs inside.
    pub content: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderInteraction {
    pub response_identifier: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub step: f64,
    pub step_label: bool,
    pub reverse: bool,
    pub prompt: Option<Vec<ContentNode>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderInteraction {
    pub response_identifier: String,
    pub shuffle: bool,
    pub prompt: Option<Vec<ContentNode>>,
    pub choices: Vec<SimpleChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

/// Names accepted by `generate` and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    Choice,
    MultipleResponse,
    TextEntry,
    ExtendedText,
    Hottext,
    Slider,
    Order,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 7] = [
        InteractionKind::Choice,
        InteractionKind::MultipleResponse,
        InteractionKind::TextEntry,
        InteractionKind::ExtendedText,
        InteractionKind::Hottext,
        InteractionKind::Slider,
        InteractionKind::Order,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InteractionKind::Choice => "choice",
            InteractionKind::MultipleResponse => "multiple-response",
            InteractionKind::TextEntry => "text-entry",
            InteractionKind::ExtendedText => "extended-text",
            InteractionKind::Hottext => "hottext",
            InteractionKind::Slider => "slider",
            InteractionKind::Order => "order",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('_', "-");
        InteractionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<_> = InteractionKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown interaction kind `{s}` (expected one of {})", names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_flattens_markup() {
        let choice = SimpleChoice {
            identifier: "A".into(),
            fixed: false,
            content: vec![
                ContentNode::text("Paris "),
                ContentNode::element("b", vec![ContentNode::text("(France)")]),
            ],
            extra: Vec::new(),
        };
        assert_eq!(choice.text(), "Paris (France)");
    }

    #[test]
    fn interaction_kind_names() {
        for kind in InteractionKind::ALL {
            assert_eq!(kind.name().parse::<InteractionKind>(), Ok(kind));
        }
        assert_eq!(
            "multiple_response".parse::<InteractionKind>(),
            Ok(InteractionKind::MultipleResponse)
        );
        assert!("drag-drop".parse::<InteractionKind>().is_err());
    }

    #[test]
    fn collects_nested_interactions() {
        let body = vec![ContentNode::element(
            "p",
            vec![ContentNode::Interaction(Interaction::TextEntry(
                TextEntryInteraction {
                    response_identifier: "R".into(),
                    expected_length: None,
                    pattern_mask: None,
                    placeholder_text: None,
                    extra: Vec::new(),
                },
            ))],
        )];
        let mut found = Vec::new();
        collect_interactions(&body, &mut found);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].response_identifier(), Some("R"));
        assert_eq!(found[0].kind(), Some(InteractionKind::TextEntry));
    }
}
