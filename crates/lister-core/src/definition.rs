//! Static description of a listable resource
//!
//! A [`ListerDefinition`] says where records come from ([`Source`]), how the record
//! array is pulled out of a response ([`Selector`]) and how each record becomes a
//! [`ListerOption`](crate::option::ListerOption) ([`Mapping`]).
//!
//! Definitions loaded from config files can only use path strings. Closures are
//! available when building definitions in code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::path::get_path;

/// Context handed to resolver functions while mapping
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    pub filters: &'a Value,
    pub query: &'a str,
}

pub type ResolverFn = dyn Fn(&Value, &MapContext<'_>) -> Value + Send + Sync;

/// Reads one option field out of a raw record
#[derive(Clone)]
pub enum Resolver {
    Path(String),
    Func(Arc<ResolverFn>),
}

impl Resolver {
    pub fn path(path: impl Into<String>) -> Self {
        Resolver::Path(path.into())
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value, &MapContext<'_>) -> Value + Send + Sync + 'static,
    {
        Resolver::Func(Arc::new(f))
    }

    /// Resolve against `raw`; missing paths and `null` results yield `None`
    pub fn resolve(&self, raw: &Value, ctx: &MapContext<'_>) -> Option<Value> {
        let value = match self {
            Resolver::Path(path) => get_path(raw, path).cloned(),
            Resolver::Func(f) => Some(f(raw, ctx)),
        };
        value.filter(|v| !v.is_null())
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Resolver::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for Resolver {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Resolver::Path)
    }
}

pub type SelectorFn = dyn Fn(&Value) -> Value + Send + Sync;

/// Locates the record array inside a response body
#[derive(Clone)]
pub enum Selector {
    Path(String),
    Func(Arc<SelectorFn>),
}

impl Selector {
    pub fn path(path: impl Into<String>) -> Self {
        Selector::Path(path.into())
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Selector::Func(Arc::new(f))
    }

    /// Human-readable form used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            Selector::Path(path) => format!("path:{path}"),
            Selector::Func(_) => "function".to_string(),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Selector::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Selector::Path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Inputs available to a custom request builder
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub filters: &'a Value,
    pub query: &'a str,
    pub cursor: Option<&'a Value>,
}

/// Request parts produced by a custom builder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltRequest {
    pub params: Option<Map<String, Value>>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

pub type RequestBuilderFn = dyn Fn(&RequestContext<'_>) -> BuiltRequest + Send + Sync;

#[derive(Clone)]
pub struct RequestBuilder(Arc<RequestBuilderFn>);

impl RequestBuilder {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RequestContext<'_>) -> BuiltRequest + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn build(&self, ctx: &RequestContext<'_>) -> BuiltRequest {
        (self.0)(ctx)
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestBuilder(..)")
    }
}

/// Where records are fetched from
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub endpoint: String,
    #[serde(default)]
    pub method: Method,
    #[serde(skip)]
    pub build_request: Option<RequestBuilder>,
}

impl Source {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Get,
            build_request: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_request_builder(mut self, builder: RequestBuilder) -> Self {
        self.build_request = Some(builder);
        self
    }
}

/// Per-field resolvers from raw record to option
#[derive(Debug, Clone, Deserialize)]
pub struct Mapping {
    pub value: Resolver,
    #[serde(default)]
    pub label: Option<Resolver>,
    #[serde(default)]
    pub icon: Option<Resolver>,
    #[serde(default)]
    pub description: Option<Resolver>,
    #[serde(default)]
    pub disabled: Option<Resolver>,
    #[serde(default)]
    pub group: Option<Resolver>,
    #[serde(default)]
    pub meta: Option<Resolver>,
}

impl Mapping {
    pub fn new(value: Resolver) -> Self {
        Self {
            value,
            label: None,
            icon: None,
            description: None,
            disabled: None,
            group: None,
            meta: None,
        }
    }

    pub fn with_label(mut self, label: Resolver) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_disabled(mut self, disabled: Resolver) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn with_group(mut self, group: Resolver) -> Self {
        self.group = Some(group);
        self
    }
}

/// A named searchable field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchSubject {
    /// Name sent to the backend as `subject`
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Record path searched locally (defaults to `key`)
    #[serde(default)]
    pub path: Option<String>,
}

impl SearchSubject {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: None,
            path: None,
        }
    }

    pub fn local_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.key)
    }
}

/// Which fields are searchable
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchSpec {
    #[serde(default)]
    pub subjects: Vec<SearchSubject>,
    /// Paths searched when targeting all fields. Empty means every scalar field.
    #[serde(default)]
    pub fields: Vec<String>,
}

impl SearchSpec {
    pub fn subject(&self, key: &str) -> Option<&SearchSubject> {
        self.subjects.iter().find(|s| s.key == key)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListerDefinition {
    pub source: Source,
    #[serde(default)]
    pub selector: Option<Selector>,
    pub mapping: Mapping,
    #[serde(default)]
    pub search: Option<SearchSpec>,
}

impl ListerDefinition {
    pub fn new(source: Source, mapping: Mapping) -> Self {
        Self {
            source,
            selector: None,
            mapping,
            search: None,
        }
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_search(mut self, search: SearchSpec) -> Self {
        self.search = Some(search);
        self
    }
}
