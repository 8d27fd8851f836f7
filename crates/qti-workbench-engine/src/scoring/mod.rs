//! # Scoring
//!
//! Pure functions from an item and a submitted response to a score. Scoring
//! never fails: problems with the response or the item come back as a zero
//! score with a [`ScoringIssue`] attached.
//!
//! Only the well-known templates are interpreted. Custom rule sets, unknown
//! templates and items without response processing are left for a human
//! (`requires_manual_scoring`), as is anything with a free-text interaction.

mod response;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use response::ResponseValue;
use response::{same_multiset, same_sequence, same_value};

use crate::model::{
    BaseType, Cardinality, Interaction, ItemDocument, Mapping, ResponseDeclaration,
    ResponseProcessing, TemplateKind,
};

const EPSILON: f64 = 1e-9;

/// How close a numeric response bound to a slider must be to count as correct.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum SliderTolerance {
    /// Half of the slider's step.
    #[default]
    HalfStep,
    Absolute(f64),
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringOptions {
    pub slider_tolerance: SliderTolerance,
}

/// Why an item scored zero without being wrong.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ScoringIssue {
    #[error("expected a {expected} response, got {submitted}")]
    CardinalityMismatch {
        expected: Cardinality,
        submitted: Cardinality,
    },

    #[error("`{value}` is not a valid {base_type} value")]
    InvalidValue { value: String, base_type: BaseType },

    #[error("the item declares no response")]
    MissingDeclaration,

    #[error("response `{response}` has no correct response")]
    MissingCorrectResponse { response: String },

    #[error("response `{response}` has no mapping")]
    MissingMapping { response: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemScore {
    pub item_id: String,
    pub earned: f64,
    pub max: f64,
    pub is_correct: bool,
    pub requires_manual_scoring: bool,
    pub issue: Option<ScoringIssue>,
}

/// Sum over several item scores. Always derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalScore {
    pub earned: f64,
    pub max: f64,
    pub percentage: f64,
    pub correct_item_count: usize,
    pub total_item_count: usize,
    pub requires_manual_scoring: bool,
}

/// Score with default options.
pub fn score(item: &ItemDocument, response: &ResponseValue) -> ItemScore {
    score_with(item, response, &ScoringOptions::default())
}

pub fn score_with(
    item: &ItemDocument,
    response: &ResponseValue,
    options: &ScoringOptions,
) -> ItemScore {
    let declaration = item.primary_declaration();
    let kind = match &item.response_processing {
        ResponseProcessing::Template { kind, .. } => Some(*kind),
        ResponseProcessing::Custom { .. } | ResponseProcessing::Absent => None,
    };
    let free_text = item
        .interactions()
        .iter()
        .any(|i| matches!(i, Interaction::ExtendedText(_)));

    let mut result = ItemScore {
        item_id: item.id.clone(),
        earned: 0.0,
        max: max_score(item, declaration, kind),
        is_correct: false,
        requires_manual_scoring: false,
        issue: None,
    };

    let kind = match kind {
        _ if free_text => None,
        Some(TemplateKind::MatchNone) => {
            result.max = 0.0;
            return result;
        }
        Some(TemplateKind::Other) => None,
        other => other,
    };
    let Some(kind) = kind else {
        result.requires_manual_scoring = true;
        return result;
    };

    let Some(declaration) = declaration else {
        result.issue = Some(ScoringIssue::MissingDeclaration);
        return log_issue(result);
    };
    if response.is_empty() {
        return result;
    }
    if let Some(issue) = check(declaration, response) {
        result.issue = Some(issue);
        return log_issue(result);
    }

    match kind {
        TemplateKind::MapResponse => match &declaration.mapping {
            Some(mapping) => {
                let total = mapped_total(mapping, declaration.base_type, response.values());
                result.earned = total.clamp(0.0, result.max.max(0.0));
                result.is_correct = result.max > 0.0 && result.earned >= result.max - EPSILON;
            }
            None => {
                result.issue = Some(ScoringIssue::MissingMapping {
                    response: declaration.identifier.clone(),
                });
                return log_issue(result);
            }
        },
        _ => {
            if declaration.correct_response.is_empty() {
                result.issue = Some(ScoringIssue::MissingCorrectResponse {
                    response: declaration.identifier.clone(),
                });
                return log_issue(result);
            }
            let tolerance = slider_tolerance(item, declaration, options);
            result.is_correct = matches_correct(declaration, response, tolerance);
            if result.is_correct {
                result.earned = result.max;
            }
        }
    }
    result
}

/// Add up several item scores.
pub fn aggregate(scores: &[ItemScore]) -> TotalScore {
    let earned: f64 = scores.iter().map(|s| s.earned).sum();
    let max: f64 = scores.iter().map(|s| s.max).sum();
    TotalScore {
        earned,
        max,
        percentage: if max > 0.0 { earned / max * 100.0 } else { 0.0 },
        correct_item_count: scores.iter().filter(|s| s.is_correct).count(),
        total_item_count: scores.len(),
        requires_manual_scoring: scores.iter().any(|s| s.requires_manual_scoring),
    }
}

fn log_issue(score: ItemScore) -> ItemScore {
    if let Some(issue) = &score.issue {
        log::debug!("item {} scored 0: {issue}", score.item_id);
    }
    score
}

/// `MAXSCORE`'s default value, else `SCORE`'s normal maximum, else what the
/// template can award.
fn max_score(
    item: &ItemDocument,
    declaration: Option<&ResponseDeclaration>,
    kind: Option<TemplateKind>,
) -> f64 {
    let declared = item
        .outcome("MAXSCORE")
        .and_then(|o| o.default_value.as_deref())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|max| max.is_finite())
        .or_else(|| item.outcome("SCORE").and_then(|o| o.normal_maximum))
        .filter(|max| max.is_finite());
    if let Some(max) = declared {
        return max;
    }

    match (kind, declaration.and_then(|d| d.mapping.as_ref().map(|m| (d, m)))) {
        (Some(TemplateKind::MapResponse), Some((declaration, mapping))) => {
            mapping_maximum(mapping, declaration.cardinality)
        }
        _ => 1.0,
    }
}

fn mapping_maximum(mapping: &Mapping, cardinality: Cardinality) -> f64 {
    if let Some(upper) = mapping.upper_bound {
        return upper;
    }
    let positive = mapping.entries.iter().map(|e| e.value).filter(|v| *v > 0.0);
    match cardinality {
        Cardinality::Single => positive.fold(0.0, f64::max),
        Cardinality::Multiple | Cardinality::Ordered => positive.sum(),
    }
}

/// A cardinality or base-type problem with the submitted response.
fn check(declaration: &ResponseDeclaration, response: &ResponseValue) -> Option<ScoringIssue> {
    let submitted = response.cardinality()?;
    if submitted != declaration.cardinality {
        return Some(ScoringIssue::CardinalityMismatch {
            expected: declaration.cardinality,
            submitted,
        });
    }
    response
        .values()
        .iter()
        .find(|value| !declaration.base_type.accepts(value))
        .map(|value| ScoringIssue::InvalidValue {
            value: value.clone(),
            base_type: declaration.base_type,
        })
}

fn matches_correct(
    declaration: &ResponseDeclaration,
    response: &ResponseValue,
    tolerance: f64,
) -> bool {
    let submitted = response.values();
    let expected = &declaration.correct_response;
    let base_type = declaration.base_type;
    match declaration.cardinality {
        Cardinality::Multiple => same_multiset(base_type, submitted, expected, tolerance),
        Cardinality::Single | Cardinality::Ordered => {
            same_sequence(base_type, submitted, expected, tolerance)
        }
    }
}

/// Each distinct submitted value counts once.
fn mapped_total(mapping: &Mapping, base_type: BaseType, submitted: &[String]) -> f64 {
    let mut seen: Vec<&str> = Vec::new();
    let mut total = 0.0;
    for value in submitted {
        if seen
            .iter()
            .any(|earlier| same_value(base_type, earlier, value, 0.0))
        {
            continue;
        }
        seen.push(value);

        let entry = mapping.entries.iter().find(|entry| {
            if entry.case_sensitive {
                same_value(base_type, &entry.key, value, 0.0)
            } else {
                entry.key.trim().eq_ignore_ascii_case(value.trim())
            }
        });
        total += entry.map_or(mapping.default_value, |e| e.value);
    }

    if let Some(lower) = mapping.lower_bound {
        total = total.max(lower);
    }
    if let Some(upper) = mapping.upper_bound {
        total = total.min(upper);
    }
    total
}

/// Numeric tolerance for a declaration bound to a slider; zero otherwise.
fn slider_tolerance(
    item: &ItemDocument,
    declaration: &ResponseDeclaration,
    options: &ScoringOptions,
) -> f64 {
    let slider = item.interactions().into_iter().find_map(|i| match i {
        Interaction::Slider(slider) if slider.response_identifier == declaration.identifier => {
            Some(slider)
        }
        _ => None,
    });
    match (slider, options.slider_tolerance) {
        (None, _) | (_, SliderTolerance::Exact) => 0.0,
        (Some(slider), SliderTolerance::HalfStep) => slider.step.abs() / 2.0,
        (Some(_), SliderTolerance::Absolute(tolerance)) => tolerance.abs(),
    }
}
