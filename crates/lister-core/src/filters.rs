//! Filter composition and filter-option trees
//!
//! Effective filters are the session's base filters with its in-session patch
//! merged on top. A filter-option tree describes the controls that write to that
//! patch; [`index_filter_options`] flattens it into a lookup by node id.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub type MergeFn = dyn Fn(&Value, &Value) -> Value + Send + Sync;

/// Custom base ⊕ patch merge
#[derive(Clone)]
pub struct FilterMerge(Arc<MergeFn>);

impl FilterMerge {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for FilterMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FilterMerge(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterNodeKind {
    /// Container without its own filter effect
    #[default]
    Group,
    /// Leaf bound to a fixed backend value
    Value,
    /// Leaf whose value comes from a live input
    Input,
}

/// One node of a filter-option tree
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub kind: FilterNodeKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub bind_key: Option<String>,
    /// Backend value written for `value` nodes (defaults to `value`)
    #[serde(default)]
    pub db_value: Option<Value>,
    /// Explicit patch fragment, overriding `{bind_key: db_value}`
    #[serde(default)]
    pub apply: Option<Map<String, Value>>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub children: Vec<FilterNode>,
}

impl FilterNode {
    pub fn group(label: impl Into<String>, children: Vec<FilterNode>) -> Self {
        Self {
            kind: FilterNodeKind::Group,
            label: Some(label.into()),
            children,
            ..Self::default()
        }
    }

    pub fn value(label: impl Into<String>, value: Value) -> Self {
        Self {
            kind: FilterNodeKind::Value,
            label: Some(label.into()),
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn input(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            kind: FilterNodeKind::Input,
            ..Self::default()
        }
    }

    pub fn with_bind_key(mut self, key: impl Into<String>) -> Self {
        self.bind_key = Some(key.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn own_segment(&self) -> String {
        match (&self.value, &self.label) {
            (Some(Value::String(s)), _) => s.clone(),
            (Some(v), _) if !v.is_null() => v.to_string(),
            (_, Some(label)) => label.clone(),
            _ => String::new(),
        }
    }
}

/// Filter controls attached to a session
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub options: Vec<FilterNode>,
    /// Refetch as soon as the patch changes
    #[serde(default = "default_auto_fetch")]
    pub auto_fetch: bool,
    #[serde(skip)]
    pub merge: Option<FilterMerge>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            auto_fetch: true,
            merge: None,
        }
    }
}

fn default_auto_fetch() -> bool {
    true
}

/// A flattened filter node
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilterNode {
    pub id: String,
    pub kind: FilterNodeKind,
    pub disabled: bool,
    pub bind_key: Option<String>,
    pub db_value: Option<Value>,
    pub apply: Option<Map<String, Value>>,
}

impl ResolvedFilterNode {
    /// Patch fragment this node contributes; `input` is the live value for input nodes
    pub fn patch(&self, input: Option<&Value>) -> Option<Map<String, Value>> {
        if let Some(apply) = &self.apply {
            return Some(apply.clone());
        }
        let key = self.bind_key.as_ref()?;
        let value = match self.kind {
            FilterNodeKind::Group => return None,
            FilterNodeKind::Value => self.db_value.clone()?,
            FilterNodeKind::Input => input.cloned().unwrap_or(Value::Null),
        };
        let mut fragment = Map::new();
        fragment.insert(key.clone(), value);
        Some(fragment)
    }
}

/// Base filters with the patch applied
pub fn compute_effective_filters(base: &Value, patch: &Value, spec: Option<&FilterSpec>) -> Value {
    if let Some(merge) = spec.and_then(|s| s.merge.as_ref()) {
        return (merge.0)(base, patch);
    }

    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            let mut merged = base.clone();
            for (key, value) in patch {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (Value::Object(_), _) => base.clone(),
        _ => patch.clone(),
    }
}

/// Flatten a filter-option tree keyed by node id
///
/// Ids derived from values or labels can collide (two siblings with the same
/// value, or nodes with neither). The first node in tree order keeps the id;
/// later ones are skipped, though their children are still indexed.
pub fn index_filter_options(tree: &[FilterNode]) -> BTreeMap<String, ResolvedFilterNode> {
    let mut index = BTreeMap::new();
    for node in tree {
        walk(node, None, None, &mut index);
    }
    index
}

fn walk(
    node: &FilterNode,
    parent_id: Option<&str>,
    inherited_key: Option<&str>,
    index: &mut BTreeMap<String, ResolvedFilterNode>,
) {
    let id = match &node.id {
        Some(id) => id.clone(),
        None => match parent_id {
            Some(parent) => format!("{parent}.{}", node.own_segment()),
            None => node.own_segment(),
        },
    };
    let bind_key = node.bind_key.as_deref().or(inherited_key);

    let db_value = match node.kind {
        FilterNodeKind::Value => node.db_value.clone().or_else(|| node.value.clone()),
        _ => node.db_value.clone(),
    };

    match index.entry(id.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(ResolvedFilterNode {
                id: id.clone(),
                kind: node.kind,
                disabled: node.disabled,
                bind_key: bind_key.map(str::to_string),
                db_value,
                apply: node.apply.clone(),
            });
        }
        Entry::Occupied(_) => debug!(id = %id, "filter_node_id_collision"),
    }

    for child in &node.children {
        walk(child, Some(id.as_str()), bind_key, index);
    }
}
