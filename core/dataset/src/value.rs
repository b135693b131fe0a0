//! FILENAME: core/dataset/src/value.rs
//! PURPOSE: Field values as stored in the dataset and carried by header nodes.
//! CONTEXT: Values are hashable (so they can be interned and grouped) and
//! totally ordered (so sibling headers can be sorted deterministically).

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Wrapper around f64 that implements Eq, Ord and Hash.
/// NaN values are treated as equal to each other and sort after every number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash equal too
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal),
        }
    }
}

/// A single value of a dimension or measure field.
///
/// Serialized untagged, so JSON `null`, numbers, strings and booleans map
/// directly onto the variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

/// Shared empty value, returned by lookups that fall outside a record.
pub static EMPTY_VALUE: FieldValue = FieldValue::Empty;

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn number(n: f64) -> Self {
        FieldValue::Number(OrderedFloat(n))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    /// Numeric view of the value. Text and booleans are not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(n.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Display label for header cells. Empty values render as `(blank)`.
    pub fn label(&self) -> String {
        match self {
            FieldValue::Empty => "(blank)".to_string(),
            other => other.to_string(),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Empty => 0,
            FieldValue::Number(_) => 1,
            FieldValue::Text(_) => 2,
            FieldValue::Boolean(_) => 3,
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order used for sorting: Empty < Number < Text < Boolean.
impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Number(n) => {
                let v = n.0;
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}", v as i64)
                } else {
                    write!(f, "{}", v)
                }
            }
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(OrderedFloat(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(OrderedFloat(value as f64))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(OrderedFloat(f64::from(value)))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Empty, Into::into)
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Empty,
            serde_json::Value::Bool(b) => FieldValue::Boolean(*b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map_or_else(|| FieldValue::Text(n.to_string()), FieldValue::from),
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            // Nested shapes are not groupable; keep their JSON text
            other => FieldValue::Text(other.to_string()),
        }
    }
}
