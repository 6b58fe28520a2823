//! Property values and the cross-width numeric normalization used when
//! markers and predicates are compared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A property value as stored on a vertex or edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
}

/// A numeric value widened to a single representation.
///
/// Integers of every width, and floats holding an integral value, collapse
/// to `Integral`, so `Int(7)`, `Long(7)` and `Double(7.0)` share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKey {
    Integral(i128),
    /// Bit pattern of a finite, non-integral `f64`.
    Fractional(u64),
}

/// Comparison operators understood by the query primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compare {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

impl Compare {
    /// Applies the operator to an already computed ordering.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Compare::Equal => ordering == Ordering::Equal,
            Compare::NotEqual => ordering != Ordering::Equal,
            Compare::GreaterThan => ordering == Ordering::Greater,
            Compare::GreaterThanEqual => ordering != Ordering::Less,
            Compare::LessThan => ordering == Ordering::Less,
            Compare::LessThanEqual => ordering != Ordering::Greater,
        }
    }
}

impl Value {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_)
        )
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(i128::from(*v)),
            Value::Long(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Normalizes a numeric value. Non-numeric values, NaN and infinities
    /// have no key.
    pub fn numeric_key(&self) -> Option<NumericKey> {
        if let Some(i) = self.as_i128() {
            return Some(NumericKey::Integral(i));
        }
        let f = self.as_f64()?;
        if !f.is_finite() {
            return None;
        }
        if f.fract() == 0.0 && f.abs() < 1.0e38 {
            Some(NumericKey::Integral(f as i128))
        } else {
            Some(NumericKey::Fractional(f.to_bits()))
        }
    }

    /// Equality that treats numbers of different widths as equal when they
    /// hold the same value. Everything else uses plain value equality.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if self.is_numeric() && other.is_numeric() {
            return matches!(
                (self.numeric_key(), other.numeric_key()),
                (Some(a), Some(b)) if a == b
            );
        }
        self == other
    }

    /// Ordering across numeric widths; strings, bools and datetimes order
    /// within their own kind. Mixed kinds are incomparable.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        if let (Some(NumericKey::Integral(a)), Some(NumericKey::Integral(b))) =
            (self.numeric_key(), other.numeric_key())
        {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_widths_share_a_key() {
        assert_eq!(Value::Int(7).numeric_key(), Value::Long(7).numeric_key());
        assert_eq!(Value::Double(7.0).numeric_key(), Value::Long(7).numeric_key());
        assert_ne!(Value::Double(7.5).numeric_key(), Value::Long(7).numeric_key());
        assert_eq!(Value::Double(f64::NAN).numeric_key(), None);
        assert_eq!(Value::from("7").numeric_key(), None);
    }

    #[test]
    fn loose_eq_crosses_widths_only_for_numbers() {
        assert!(Value::Int(42).loose_eq(&Value::Long(42)));
        assert!(Value::Float(1.5).loose_eq(&Value::Double(1.5)));
        assert!(!Value::Int(1).loose_eq(&Value::Bool(true)));
        assert!(Value::from("a").loose_eq(&Value::from("a")));
    }

    #[test]
    fn loose_eq_agrees_with_numeric_key_at_the_long_boundary() {
        // 2^63 is exact as a double but one past i64::MAX.
        let wide = Value::Double(9_223_372_036_854_775_808.0);
        assert!(!Value::Long(i64::MAX).loose_eq(&wide));
        assert_ne!(Value::Long(i64::MAX).numeric_key(), wide.numeric_key());
        assert_eq!(Value::Long(i64::MAX).loose_cmp(&wide), Some(Ordering::Less));
        assert!(Value::Int(5).loose_eq(&Value::Double(5.0)));
        assert_eq!(Value::Int(5).loose_cmp(&Value::Double(5.0)), Some(Ordering::Equal));
        assert!(!Value::Double(f64::NAN).loose_eq(&Value::Double(f64::NAN)));
    }

    #[test]
    fn loose_cmp_rejects_mixed_kinds() {
        assert_eq!(
            Value::Int(3).loose_cmp(&Value::Double(2.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::from("x").loose_cmp(&Value::Int(1)), None);
        assert!(Compare::GreaterThanEqual.holds(Ordering::Equal));
        assert!(!Compare::LessThan.holds(Ordering::Equal));
    }
}
