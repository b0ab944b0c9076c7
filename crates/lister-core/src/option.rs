//! Selectable options and their identifiers

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identifier of an option: a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionId {
    Int(i64),
    Text(String),
}

impl OptionId {
    /// Coerce a resolved JSON value into an id.
    ///
    /// `null` yields `None`. Integers stay numeric; every other value is keyed by its
    /// string form so equality stays stable.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(OptionId::Text(s.clone())),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => OptionId::Int(i),
                None => OptionId::Text(n.to_string()),
            }),
            Value::Bool(b) => Some(OptionId::Text(b.to_string())),
            other => Some(OptionId::Text(other.to_string())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            OptionId::Int(i) => Value::from(*i),
            OptionId::Text(s) => Value::from(s.as_str()),
        }
    }

    /// Parse user input: integers become `Int`, anything else `Text`
    pub fn parse(input: &str) -> Self {
        input
            .parse::<i64>()
            .map(OptionId::Int)
            .unwrap_or_else(|_| OptionId::Text(input.to_string()))
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionId::Int(i) => write!(f, "{i}"),
            OptionId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for OptionId {
    fn from(s: &str) -> Self {
        OptionId::Text(s.to_string())
    }
}

impl From<String> for OptionId {
    fn from(s: String) -> Self {
        OptionId::Text(s)
    }
}

impl From<i64> for OptionId {
    fn from(i: i64) -> Self {
        OptionId::Int(i)
    }
}

impl From<i32> for OptionId {
    fn from(i: i32) -> Self {
        OptionId::Int(i64::from(i))
    }
}

/// A normalized, selectable entry produced by the mapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListerOption {
    pub value: OptionId,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// The record this option was mapped from
    #[serde(default)]
    pub raw: Value,
}

impl ListerOption {
    pub fn new(value: impl Into<OptionId>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            icon: None,
            description: None,
            disabled: false,
            group: None,
            meta: None,
            raw: Value::Null,
        }
    }
}
