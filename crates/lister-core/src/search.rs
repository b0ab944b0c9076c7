//! Search targets, the backend search payload, and client-side matching

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::definition::SearchSpec;
use crate::mapper::text;
use crate::path::get_path;

/// Where narrowing happens for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Local,
    #[default]
    Remote,
    Hybrid,
}

impl SearchMode {
    /// Query changes trigger a refetch
    pub fn fetches_on_query(&self) -> bool {
        matches!(self, SearchMode::Remote | SearchMode::Hybrid)
    }

    /// Options are narrowed on the client
    pub fn filters_locally(&self) -> bool {
        matches!(self, SearchMode::Local | SearchMode::Hybrid)
    }
}

/// A field key in a `searchOnly` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchKey {
    Index(i64),
    Name(String),
}

impl SearchKey {
    fn as_path(&self) -> String {
        match self {
            SearchKey::Index(i) => i.to_string(),
            SearchKey::Name(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SearchTarget {
    #[default]
    All,
    Subject { subject: String },
    Only { only: Vec<SearchKey> },
}

/// Search fields merged into request params
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_only: Option<Vec<SearchKey>>,
}

impl SearchPayload {
    pub fn from_target(target: &SearchTarget) -> Self {
        match target {
            SearchTarget::All => Self {
                search_all: Some(true),
                ..Self::default()
            },
            SearchTarget::Subject { subject } => Self {
                subject: Some(subject.clone()),
                ..Self::default()
            },
            SearchTarget::Only { only } => Self {
                search_only: Some(only.clone()),
                ..Self::default()
            },
        }
    }

    /// Write the payload fields into `params`
    pub fn merge_into(&self, params: &mut Map<String, Value>) {
        if let Some(subject) = &self.subject {
            params.insert("subject".to_string(), Value::from(subject.as_str()));
        }
        if let Some(all) = self.search_all {
            params.insert("searchAll".to_string(), Value::Bool(all));
        }
        if let Some(only) = &self.search_only {
            let keys = only
                .iter()
                .map(|k| match k {
                    SearchKey::Index(i) => Value::from(*i),
                    SearchKey::Name(n) => Value::from(n.as_str()),
                })
                .collect();
            params.insert("searchOnly".to_string(), Value::Array(keys));
        }
    }
}

/// Client-side matcher for raw records
#[derive(Debug, Clone)]
pub struct LocalSearch<'a> {
    needle: String,
    target: &'a SearchTarget,
    spec: Option<&'a SearchSpec>,
    filters: Option<&'a Value>,
}

impl<'a> LocalSearch<'a> {
    pub fn new(query: &str, target: &'a SearchTarget, spec: Option<&'a SearchSpec>) -> Self {
        Self {
            needle: query.trim().to_lowercase(),
            target,
            spec,
            filters: None,
        }
    }

    /// Also require records to match the given filter object
    pub fn with_filters(mut self, filters: Option<&'a Value>) -> Self {
        self.filters = filters;
        self
    }

    pub fn matches(&self, raw: &Value) -> bool {
        self.matches_query(raw) && self.matches_filters(raw)
    }

    fn matches_query(&self, raw: &Value) -> bool {
        if self.needle.is_empty() {
            return true;
        }

        match self.target {
            SearchTarget::All => match self.spec.filter(|s| !s.fields.is_empty()) {
                Some(spec) => spec.fields.iter().any(|path| self.path_contains(raw, path)),
                None => scalar_fields(raw).any(|v| self.value_contains(v)),
            },
            SearchTarget::Subject { subject } => {
                let path = self
                    .spec
                    .and_then(|s| s.subject(subject))
                    .map_or(subject.as_str(), |s| s.local_path());
                self.path_contains(raw, path)
            }
            SearchTarget::Only { only } => only
                .iter()
                .any(|key| self.path_contains(raw, &key.as_path())),
        }
    }

    fn path_contains(&self, raw: &Value, path: &str) -> bool {
        get_path(raw, path).is_some_and(|v| self.value_contains(v))
    }

    fn value_contains(&self, value: &Value) -> bool {
        match value {
            Value::Null | Value::Object(_) => false,
            Value::Array(items) => items.iter().any(|v| self.value_contains(v)),
            scalar => text(scalar).to_lowercase().contains(&self.needle),
        }
    }

    fn matches_filters(&self, raw: &Value) -> bool {
        let Some(Value::Object(filters)) = self.filters else {
            return true;
        };

        filters
            .iter()
            .filter(|(_, wanted)| is_active(wanted))
            .all(|(key, wanted)| match get_path(raw, key) {
                Some(actual) => loosely_matches(actual, wanted),
                None => false,
            })
    }
}

fn scalar_fields(raw: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match raw {
        Value::Object(map) => Box::new(map.values()),
        other => Box::new(std::iter::once(other)),
    }
}

/// Empty filter values do not constrain
fn is_active(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn loosely_matches(actual: &Value, wanted: &Value) -> bool {
    match (actual, wanted) {
        (Value::Array(have), Value::Array(want)) => {
            have.iter().any(|a| want.iter().any(|w| loosely_matches(a, w)))
        }
        (_, Value::Array(want)) => want.iter().any(|w| loosely_matches(actual, w)),
        (Value::Array(have), _) => have.iter().any(|a| loosely_matches(a, wanted)),
        _ => text(actual) == text(wanted),
    }
}
