//! # Document Model
//!
//! Plain owned data describing assessment items. Nothing in here knows how
//! the data was written down: the parser builds these values from text, the
//! serializer writes them back, and the scoring engine only reads them.
//!
//! - [`ItemDocument`] - one assessment item
//! - [`declaration`] - response/outcome declarations and response processing
//! - [`content`] - the item body: static content interleaved with interactions
//! - [`diagnostics`] - semantic warnings and unsupported-element tallies

pub mod content;
pub mod declaration;
pub mod diagnostics;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use content::{
    ChoiceInteraction, ContentNode, ExtendedTextInteraction, HottextInteraction, Interaction,
    InteractionKind, OrderInteraction, SimpleChoice, SliderInteraction, TextEntryInteraction,
    UnknownNode,
};
pub use declaration::{
    BaseType, Cardinality, MapEntry, Mapping, OutcomeDeclaration, ResponseDeclaration,
    ResponseProcessing, TemplateKind,
};
pub use diagnostics::{UnsupportedElement, Warning};

/// The surface syntax a document is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Element/attribute markup (XML).
    Markup,
    /// Nested key/value objects (JSON).
    #[serde(alias = "object")]
    StructuredObject,
}

impl Format {
    /// Guess the format from the first non-whitespace byte.
    pub fn detect(text: &str) -> Format {
        match text.trim_start().as_bytes().first() {
            Some(b'{' | b'[') => Format::StructuredObject,
            _ => Format::Markup,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Markup => f.write_str("markup"),
            Format::StructuredObject => f.write_str("object"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markup" | "xml" => Ok(Format::Markup),
            "object" | "json" | "structured_object" | "structured-object" => {
                Ok(Format::StructuredObject)
            }
            other => Err(format!("unknown format `{other}` (expected markup or object)")),
        }
    }
}

/// Version of the interchange vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecVersion {
    /// camelCase element and attribute names (`choiceInteraction`).
    #[serde(rename = "2.1")]
    V2_1,
    /// `qti-` prefixed kebab-case element names (`qti-choice-interaction`).
    #[serde(rename = "3.0")]
    V3_0,
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecVersion::V2_1 => f.write_str("2.1"),
            SpecVersion::V3_0 => f.write_str("3.0"),
        }
    }
}

impl FromStr for SpecVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches(['v', 'V']) {
            "2.1" | "2" => Ok(SpecVersion::V2_1),
            "3.0" | "3" => Ok(SpecVersion::V3_0),
            other => Err(format!("unknown version `{other}` (expected 2.1 or 3.0)")),
        }
    }
}

/// One assessment item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub id: String,
    pub title: Option<String>,
    pub format: Format,
    pub spec_version: SpecVersion,
    pub response_declarations: Vec<ResponseDeclaration>,
    pub outcome_declarations: Vec<OutcomeDeclaration>,
    pub body: Vec<ContentNode>,
    pub response_processing: ResponseProcessing,
    /// Item-level sections outside the vocabulary, kept verbatim.
    pub unknown_sections: Vec<UnknownNode>,
    pub unsupported_elements: Vec<UnsupportedElement>,
    pub warnings: Vec<Warning>,
}

impl ItemDocument {
    /// An empty item with the given identifier.
    pub fn new(id: impl Into<String>, format: Format, spec_version: SpecVersion) -> Self {
        Self {
            id: id.into(),
            title: None,
            format,
            spec_version,
            response_declarations: Vec::new(),
            outcome_declarations: Vec::new(),
            body: Vec::new(),
            response_processing: ResponseProcessing::Absent,
            unknown_sections: Vec::new(),
            unsupported_elements: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn declaration(&self, identifier: &str) -> Option<&ResponseDeclaration> {
        self.response_declarations
            .iter()
            .find(|d| d.identifier == identifier)
    }

    /// `RESPONSE` if declared, otherwise the first declaration.
    pub fn primary_declaration(&self) -> Option<&ResponseDeclaration> {
        self.declaration("RESPONSE")
            .or_else(|| self.response_declarations.first())
    }

    pub fn outcome(&self, identifier: &str) -> Option<&OutcomeDeclaration> {
        self.outcome_declarations
            .iter()
            .find(|o| o.identifier == identifier)
    }

    /// Every interaction in the body, depth first.
    pub fn interactions(&self) -> Vec<&Interaction> {
        let mut found = Vec::new();
        content::collect_interactions(&self.body, &mut found);
        found
    }
}
