//! Non-fatal findings attached to parsed items.
//!
//! Syntax errors live in the syntax crate. What is here never blocks an item
//! from being modeled: [`Warning`]s describe content that was understood but
//! is questionable, [`UnsupportedElement`]s count content that was kept
//! verbatim because it is outside the vocabulary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A semantic problem in an item that still renders and scores.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    #[error("{interaction} refers to undeclared response `{response_identifier}`")]
    DanglingResponseIdentifier {
        interaction: String,
        response_identifier: String,
    },

    #[error("{interaction} has no response identifier")]
    MissingResponseIdentifier { interaction: String },

    #[error("{element} {attribute}=\"{value}\" is not a number, using {default}")]
    DefaultedNumber {
        element: String,
        attribute: String,
        value: String,
        default: String,
    },

    #[error("{element} {attribute}=\"{value}\" is not recognised, using {default}")]
    DefaultedKeyword {
        element: String,
        attribute: String,
        value: String,
        default: String,
    },

    #[error("response `{identifier}` is declared more than once")]
    DuplicateDeclaration { identifier: String },

    #[error("response `{identifier}` has single cardinality but {count} correct values")]
    TooManyCorrectValues { identifier: String, count: usize },

    #[error("item has no identifier")]
    MissingItemIdentifier,
}

/// Content the parser kept but does not model, aggregated by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedElement {
    pub kind: String,
    pub count: u32,
    pub description: String,
}

/// Aggregates unsupported elements by kind in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Tally(Vec<UnsupportedElement>);

impl Tally {
    pub(crate) fn record(&mut self, kind: &str, description: impl FnOnce() -> String) {
        match self.0.iter_mut().find(|u| u.kind == kind) {
            Some(existing) => existing.count += 1,
            None => self.0.push(UnsupportedElement {
                kind: kind.to_string(),
                count: 1,
                description: description(),
            }),
        }
    }

    pub(crate) fn merge(&mut self, other: &[UnsupportedElement]) {
        for element in other {
            match self.0.iter_mut().find(|u| u.kind == element.kind) {
                Some(existing) => existing.count += element.count,
                None => self.0.push(element.clone()),
            }
        }
    }

    pub(crate) fn into_vec(self) -> Vec<UnsupportedElement> {
        self.0
    }
}
