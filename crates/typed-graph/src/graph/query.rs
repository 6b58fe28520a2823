use super::{Direction, VertexId};
use crate::value::{Compare, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One conjunct of a filtered query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// `key <compare> value`. A `None` value stands for null: `Equal`
    /// matches an absent property and `NotEqual` a present one.
    Has {
        key: String,
        compare: Compare,
        value: Option<Value>,
    },
    /// Half-open range `low <= key < high`.
    Interval { key: String, low: Value, high: Value },
}

impl Predicate {
    pub fn key(&self) -> &str {
        match self {
            Predicate::Has { key, .. } | Predicate::Interval { key, .. } => key,
        }
    }

    /// Evaluates the predicate against the property this predicate names.
    pub fn matches(&self, property: Option<&Value>) -> bool {
        match self {
            Predicate::Has {
                compare,
                value: None,
                ..
            } => match compare {
                Compare::Equal => property.is_none(),
                Compare::NotEqual => property.is_some(),
                _ => false,
            },
            Predicate::Has {
                compare,
                value: Some(expected),
                ..
            } => match (property, compare) {
                (None, Compare::NotEqual) => true,
                (None, _) => false,
                (Some(actual), Compare::Equal) => actual.loose_eq(expected),
                (Some(actual), Compare::NotEqual) => !actual.loose_eq(expected),
                (Some(actual), op) => actual
                    .loose_cmp(expected)
                    .is_some_and(|ordering| op.holds(ordering)),
            },
            Predicate::Interval { low, high, .. } => property.is_some_and(|actual| {
                matches!(
                    actual.loose_cmp(low),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && actual.loose_cmp(high) == Some(Ordering::Less)
            }),
        }
    }
}

/// A compiled predicate chain, handed to the storage's query primitive.
///
/// Predicates are kept in the order they were added. A plan with an
/// anchor is vertex-centric: it filters the anchor's incident edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub predicates: Vec<Predicate>,
    pub limit: Option<usize>,
    pub anchor: Option<VertexId>,
    pub direction: Direction,
    pub labels: Vec<String>,
}

impl Default for QueryPlan {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            limit: None,
            anchor: None,
            direction: Direction::Both,
            labels: Vec::new(),
        }
    }
}

impl QueryPlan {
    pub fn anchored(vertex: VertexId) -> Self {
        Self {
            anchor: Some(vertex),
            ..Self::default()
        }
    }

    /// True when every predicate holds for the property lookup.
    pub fn matches<'a, F>(&self, mut lookup: F) -> bool
    where
        F: FnMut(&str) -> Option<&'a Value>,
    {
        self.predicates
            .iter()
            .all(|predicate| predicate.matches(lookup(predicate.key())))
    }

    pub fn label_allowed(&self, label: &str) -> bool {
        self.labels.is_empty() || self.labels.iter().any(|l| l == label)
    }
}
