//! Response and outcome declarations, and the response-processing reference.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::SpecVersion;
use super::content::UnknownNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    Single,
    Multiple,
    Ordered,
}

impl Cardinality {
    /// The keyword used in documents.
    pub fn name(self) -> &'static str {
        match self {
            Cardinality::Single => "single",
            Cardinality::Multiple => "multiple",
            Cardinality::Ordered => "ordered",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cardinality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Cardinality::Single),
            "multiple" => Ok(Cardinality::Multiple),
            "ordered" => Ok(Cardinality::Ordered),
            other => Err(format!("unknown cardinality `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseType {
    #[default]
    Identifier,
    String,
    Float,
    Integer,
    Boolean,
    Point,
    Pair,
    DirectedPair,
    Duration,
    File,
    Uri,
    IntOrIdentifier,
}

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[\p{L}_][\p{L}\p{N}_.\-]*$").expect("Invalid identifier regex")
    })
}

/// True for strings usable as a QTI identifier.
pub fn is_identifier(value: &str) -> bool {
    identifier_regex().is_match(value)
}

impl BaseType {
    /// The keyword used in documents.
    pub fn name(self) -> &'static str {
        match self {
            BaseType::Identifier => "identifier",
            BaseType::String => "string",
            BaseType::Float => "float",
            BaseType::Integer => "integer",
            BaseType::Boolean => "boolean",
            BaseType::Point => "point",
            BaseType::Pair => "pair",
            BaseType::DirectedPair => "directedPair",
            BaseType::Duration => "duration",
            BaseType::File => "file",
            BaseType::Uri => "uri",
            BaseType::IntOrIdentifier => "intOrIdentifier",
        }
    }

    /// Values of these types compare as numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, BaseType::Float | BaseType::Integer | BaseType::Duration)
    }

    /// Whether `value` is a well-formed literal of this type.
    pub fn accepts(self, value: &str) -> bool {
        let value = value.trim();
        match self {
            BaseType::Identifier => is_identifier(value),
            BaseType::Integer => value.parse::<i64>().is_ok(),
            BaseType::Float | BaseType::Duration => {
                value.parse::<f64>().is_ok_and(f64::is_finite)
            }
            BaseType::Boolean => matches!(value, "true" | "false"),
            BaseType::Point => {
                let parts: Vec<_> = value.split_whitespace().collect();
                parts.len() == 2 && parts.iter().all(|p| p.parse::<i64>().is_ok())
            }
            BaseType::Pair | BaseType::DirectedPair => {
                let parts: Vec<_> = value.split_whitespace().collect();
                parts.len() == 2 && parts.iter().all(|p| is_identifier(p))
            }
            BaseType::IntOrIdentifier => value.parse::<i64>().is_ok() || is_identifier(value),
            BaseType::String | BaseType::File | BaseType::Uri => true,
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let base_type = match s {
            "identifier" => BaseType::Identifier,
            "string" => BaseType::String,
            "float" => BaseType::Float,
            "integer" => BaseType::Integer,
            "boolean" => BaseType::Boolean,
            "point" => BaseType::Point,
            "pair" => BaseType::Pair,
            "directedPair" => BaseType::DirectedPair,
            "duration" => BaseType::Duration,
            "file" => BaseType::File,
            "uri" => BaseType::Uri,
            "intOrIdentifier" => BaseType::IntOrIdentifier,
            other => return Err(format!("unknown base type `{other}`")),
        };
        Ok(base_type)
    }
}

/// The expected answer's shape and correct value(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDeclaration {
    pub identifier: String,
    pub cardinality: Cardinality,
    pub base_type: BaseType,
    pub correct_response: Vec<String>,
    pub mapping: Option<Mapping>,
    /// Children or fields outside the vocabulary, kept verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

impl ResponseDeclaration {
    pub fn new(
        identifier: impl Into<String>,
        cardinality: Cardinality,
        base_type: BaseType,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            cardinality,
            base_type,
            correct_response: Vec::new(),
            mapping: None,
            extra: Vec::new(),
        }
    }
}

/// Per-value weights used by the map-response template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub default_value: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub entries: Vec<MapEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: String,
    pub value: f64,
    pub case_sensitive: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDeclaration {
    pub identifier: String,
    pub cardinality: Cardinality,
    pub base_type: BaseType,
    pub default_value: Option<String>,
    pub normal_maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<UnknownNode>,
}

/// The well-known scoring templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    MatchCorrect,
    MapResponse,
    MatchNone,
    /// A template URI we do not interpret.
    Other,
}

fn template_regex() -> &'static Regex {
    static TEMPLATE: OnceLock<Regex> = OnceLock::new();
    TEMPLATE.get_or_init(|| {
        Regex::new(r"(?:^|[/#])(match_correct|map_response|match_none)(?:\.xml)?/?$")
            .expect("Invalid template regex")
    })
}

impl TemplateKind {
    /// Recognise a template from the last path segment of its URI.
    pub fn from_uri(uri: &str) -> TemplateKind {
        let Some(captures) = template_regex().captures(uri.trim()) else {
            return TemplateKind::Other;
        };
        match &captures[1] {
            "match_correct" => TemplateKind::MatchCorrect,
            "map_response" => TemplateKind::MapResponse,
            _ => TemplateKind::MatchNone,
        }
    }

    /// Canonical URI of the template for a vocabulary version.
    pub fn uri(self, version: SpecVersion) -> Option<String> {
        let name = match self {
            TemplateKind::MatchCorrect => "match_correct",
            TemplateKind::MapResponse => "map_response",
            TemplateKind::MatchNone => "match_none",
            TemplateKind::Other => return None,
        };
        Some(match version {
            SpecVersion::V2_1 => {
                format!("http://www.imsglobal.org/question/qti_v2p1/rptemplates/{name}")
            }
            SpecVersion::V3_0 => {
                format!("https://purl.imsglobal.org/spec/qti/v3p0/rptemplates/{name}.xml")
            }
        })
    }
}

/// How responses turn into a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "processing", rename_all = "snake_case")]
pub enum ResponseProcessing {
    /// A reference to a well-known template.
    Template { kind: TemplateKind, uri: String },
    /// An explicit rule set, kept verbatim and never interpreted.
    Custom { raw: String },
    Absent,
}

impl ResponseProcessing {
    pub fn template(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        ResponseProcessing::Template {
            kind: TemplateKind::from_uri(&uri),
            uri,
        }
    }
}
