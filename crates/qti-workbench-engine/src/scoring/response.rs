//! Submitted responses and how their values compare.

use serde::{Deserialize, Serialize};

use crate::model::{BaseType, Cardinality};

/// What a learner submitted for one declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cardinality", content = "value", rename_all = "snake_case")]
pub enum ResponseValue {
    /// Nothing submitted.
    Empty,
    Single(String),
    /// An unordered selection.
    Multiple(Vec<String>),
    /// A sequence; position matters.
    Ordered(Vec<String>),
}

impl ResponseValue {
    /// A response of the given cardinality holding `values`.
    pub fn with_cardinality(cardinality: Cardinality, mut values: Vec<String>) -> Self {
        match cardinality {
            _ if values.is_empty() => ResponseValue::Empty,
            Cardinality::Single if values.len() == 1 => {
                ResponseValue::Single(values.remove(0))
            }
            // Kept as a list so the cardinality mismatch is visible when scored.
            Cardinality::Single | Cardinality::Multiple => ResponseValue::Multiple(values),
            Cardinality::Ordered => ResponseValue::Ordered(values),
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            ResponseValue::Empty => &[],
            ResponseValue::Single(value) => std::slice::from_ref(value),
            ResponseValue::Multiple(values) | ResponseValue::Ordered(values) => values,
        }
    }

    /// `None` for [`ResponseValue::Empty`].
    pub fn cardinality(&self) -> Option<Cardinality> {
        match self {
            ResponseValue::Empty => None,
            ResponseValue::Single(_) => Some(Cardinality::Single),
            ResponseValue::Multiple(_) => Some(Cardinality::Multiple),
            ResponseValue::Ordered(_) => Some(Cardinality::Ordered),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

/// Equality of two literals of `base_type`. Numbers compare numerically
/// within `tolerance`; pairs ignore the order of their two identifiers.
pub(crate) fn same_value(base_type: BaseType, a: &str, b: &str, tolerance: f64) -> bool {
    let (a, b) = (a.trim(), b.trim());
    match base_type {
        BaseType::Float | BaseType::Integer | BaseType::Duration => {
            match (a.parse::<f64>(), b.parse::<f64>()) {
                (Ok(x), Ok(y)) => (x - y).abs() <= tolerance,
                _ => a == b,
            }
        }
        BaseType::Pair => {
            let mut x: Vec<_> = a.split_whitespace().collect();
            let mut y: Vec<_> = b.split_whitespace().collect();
            x.sort_unstable();
            y.sort_unstable();
            x == y
        }
        BaseType::DirectedPair | BaseType::Point => a.split_whitespace().eq(b.split_whitespace()),
        _ => a == b,
    }
}

/// Multiset equality under [`same_value`].
pub(crate) fn same_multiset(
    base_type: BaseType,
    submitted: &[String],
    expected: &[String],
    tolerance: f64,
) -> bool {
    if submitted.len() != expected.len() {
        return false;
    }
    let mut used = vec![false; expected.len()];
    submitted.iter().all(|value| {
        let found = expected.iter().enumerate().position(|(i, candidate)| {
            !used[i] && same_value(base_type, value, candidate, tolerance)
        });
        match found {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Element-wise equality under [`same_value`].
pub(crate) fn same_sequence(
    base_type: BaseType,
    submitted: &[String],
    expected: &[String],
    tolerance: f64,
) -> bool {
    submitted.len() == expected.len()
        && submitted
            .iter()
            .zip(expected)
            .all(|(a, b)| same_value(base_type, a, b, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[rstest]
    #[case(BaseType::Identifier, "A", "A", true)]
    #[case(BaseType::Identifier, "A", "a", false)]
    #[case(BaseType::Float, "1.50", "1.5", true)]
    #[case(BaseType::Integer, "007", "7", true)]
    #[case(BaseType::Integer, "seven", "7", false)]
    #[case(BaseType::Pair, "A B", "B A", true)]
    #[case(BaseType::DirectedPair, "A B", "B A", false)]
    #[case(BaseType::Point, "10  20", "10 20", true)]
    #[case(BaseType::String, " padded ", "padded", true)]
    fn exact_values(
        #[case] base_type: BaseType,
        #[case] a: &str,
        #[case] b: &str,
        #[case] same: bool,
    ) {
        assert_eq!(same_value(base_type, a, b, 0.0), same);
    }

    #[test]
    fn numeric_tolerance() {
        assert!(same_value(BaseType::Float, "49.6", "50", 0.5));
        assert!(!same_value(BaseType::Float, "49.4", "50", 0.5));
    }

    #[test]
    fn multisets_ignore_order_but_count_repeats() {
        let expected = strings(&["a", "c"]);
        assert!(same_multiset(BaseType::Identifier, &strings(&["c", "a"]), &expected, 0.0));
        assert!(!same_multiset(BaseType::Identifier, &strings(&["a", "a"]), &expected, 0.0));
        assert!(!same_multiset(BaseType::Identifier, &strings(&["a"]), &expected, 0.0));
    }

    #[test]
    fn sequences_respect_order() {
        let expected = strings(&["a", "b"]);
        assert!(same_sequence(BaseType::Identifier, &strings(&["a", "b"]), &expected, 0.0));
        assert!(!same_sequence(BaseType::Identifier, &strings(&["b", "a"]), &expected, 0.0));
    }

    #[test]
    fn build_from_cardinality() {
        assert_eq!(
            ResponseValue::with_cardinality(Cardinality::Single, strings(&["A"])),
            ResponseValue::Single("A".into())
        );
        assert_eq!(
            ResponseValue::with_cardinality(Cardinality::Single, strings(&["A", "B"])),
            ResponseValue::Multiple(strings(&["A", "B"]))
        );
        assert_eq!(
            ResponseValue::with_cardinality(Cardinality::Ordered, vec![]),
            ResponseValue::Empty
        );
        assert_eq!(ResponseValue::Single("x".into()).values(), ["x"]);
    }
}
