//! Item key values.
//!
//! A collection that enforces uniqueness reads one designated field from each
//! item. The value of that field is an [`ItemKey`].

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{Error, Result};

/// The value of an item's unique key field.
///
/// Any scalar JSON value except `null` is a key. Arrays and objects are not:
/// they have no natural identity to compare by.
///
/// Numbers are canonical. An integral value that fits in an `i64` is always
/// an [`Integer`](Self::Integer), so `2` and `2.0` are the same key. Larger
/// positive integers are [`Unsigned`](Self::Unsigned), everything else is a
/// [`Float`](Self::Float).
///
/// Keys of different kinds never compare equal. Ordering puts booleans
/// first, then integers, unsigned integers, floats and finally text.
#[derive(Debug, Clone)]
pub enum ItemKey {
    /// A boolean key, e.g. `{"id": true}`.
    Bool(bool),
    /// An integral key, e.g. `{"id": 1}`.
    Integer(i64),
    /// An integral key above `i64::MAX`.
    Unsigned(u64),
    /// A non-integral numeric key, e.g. `{"id": 1.5}`.
    Float(f64),
    /// A textual key, e.g. `{"name": "osm"}`.
    Text(String),
}

impl ItemKey {
    /// Creates a textual key.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Creates a numeric key in canonical form.
    #[must_use]
    pub fn float(value: f64) -> Self {
        if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
            // Also folds -0.0 into 0.
            Self::Integer(value as i64)
        } else {
            Self::Float(value)
        }
    }

    /// Reads a key from a JSON value. `None` for `null`, arrays and objects.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Self::Unsigned(u))
                } else {
                    n.as_f64().map(Self::float)
                }
            }
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Reads the key stored under `field` of a JSON object.
    #[must_use]
    pub fn from_field(record: &Value, field: &str) -> Option<Self> {
        record.get(field).and_then(Self::from_value)
    }

    /// Returns the key as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Unsigned(u) => Value::from(*u),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }

    /// Returns the text if this is a textual key.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an integral key that fits in an `i64`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value of any numeric key.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Unsigned(u) => Some(*u as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Integer(_) => 1,
            Self::Unsigned(_) => 2,
            Self::Float(_) => 3,
            Self::Text(_) => 4,
        }
    }
}

impl PartialEq for ItemKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ItemKey {}

impl PartialOrd for ItemKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Unsigned(a), Self::Unsigned(b)) => a.cmp(b),
            // Equal under total_cmp means identical bits, matching `hash`.
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for ItemKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Bool(b) => b.hash(state),
            Self::Integer(i) => i.hash(state),
            Self::Unsigned(u) => u.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Text(s) => s.hash(state),
        }
    }
}

impl Serialize for ItemKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Unsigned(u) => serializer.serialize_u64(*u),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for ItemKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(&value).map_err(de::Error::custom)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Unsigned(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ItemKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ItemKey {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ItemKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ItemKey {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ItemKey {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u64> for ItemKey {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Self::Integer(i),
            Err(_) => Self::Unsigned(value),
        }
    }
}

impl From<f64> for ItemKey {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl TryFrom<&Value> for ItemKey {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value).ok_or_else(|| Error::InvalidKey(value.to_string()))
    }
}
