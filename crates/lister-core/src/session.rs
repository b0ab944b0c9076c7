//! Per-session state
//!
//! A [`Session`] is one open "pick a value" interaction. Sessions live in the
//! [`SessionStore`](crate::store::SessionStore) and are only changed by runtime
//! actions, each of which writes a fresh copy.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::definition::ListerDefinition;
use crate::details::{Details, OpenResult};
use crate::filters::FilterSpec;
use crate::option::{ListerOption, OptionId};
use crate::search::{SearchMode, SearchTarget};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Single,
    Multiple,
}

/// The selection while a session is open, always shaped by its [`Mode`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DraftValue {
    Multiple(Vec<OptionId>),
    Single(Option<OptionId>),
}

impl DraftValue {
    pub fn empty(mode: Mode) -> Self {
        match mode {
            Mode::Single => DraftValue::Single(None),
            Mode::Multiple => DraftValue::Multiple(Vec::new()),
        }
    }

    /// Reshape any value for `mode`. Multiple values are deduplicated in order;
    /// a single value keeps the first id.
    pub fn normalize(self, mode: Mode) -> Self {
        match (mode, self) {
            (Mode::Single, DraftValue::Single(id)) => DraftValue::Single(id),
            (Mode::Single, DraftValue::Multiple(ids)) => DraftValue::Single(ids.into_iter().next()),
            (Mode::Multiple, value) => {
                let mut unique: Vec<OptionId> = Vec::new();
                for id in value.into_ids() {
                    if !unique.contains(&id) {
                        unique.push(id);
                    }
                }
                DraftValue::Multiple(unique)
            }
        }
    }

    pub fn ids(&self) -> &[OptionId] {
        match self {
            DraftValue::Multiple(ids) => ids,
            DraftValue::Single(id) => id.as_slice(),
        }
    }

    pub fn into_ids(self) -> Vec<OptionId> {
        match self {
            DraftValue::Multiple(ids) => ids,
            DraftValue::Single(id) => id.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: &OptionId) -> bool {
        self.ids().contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    pub fn matches_mode(&self, mode: Mode) -> bool {
        matches!(
            (mode, self),
            (Mode::Single, DraftValue::Single(_)) | (Mode::Multiple, DraftValue::Multiple(_))
        )
    }
}

impl From<OptionId> for DraftValue {
    fn from(id: OptionId) -> Self {
        DraftValue::Single(Some(id))
    }
}

impl From<Vec<OptionId>> for DraftValue {
    fn from(ids: Vec<OptionId>) -> Self {
        DraftValue::Multiple(ids)
    }
}

/// Passed to `on_change`; preventing it keeps the store unchanged
#[derive(Debug, Default)]
pub struct ChangeEvent {
    prevented: bool,
}

impl ChangeEvent {
    pub fn prevent_default(&mut self) {
        self.prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.prevented
    }
}

pub type ChangeFn = dyn Fn(&DraftValue, &Details, &mut ChangeEvent) + Send + Sync;

#[derive(Clone)]
pub struct ChangeHandler(Arc<ChangeFn>);

impl ChangeHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&DraftValue, &Details, &mut ChangeEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, next: &DraftValue, details: &Details, event: &mut ChangeEvent) {
        (self.0)(next, details, event)
    }
}

impl fmt::Debug for ChangeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangeHandler(..)")
    }
}

/// Settles the `open` future. Fires at most once.
pub struct Completion {
    tx: Mutex<Option<oneshot::Sender<OpenResult>>>,
}

impl Completion {
    pub fn new() -> (Arc<Self>, oneshot::Receiver<OpenResult>) {
        let (tx, rx) = oneshot::channel();
        (
            Arc::new(Self {
                tx: Mutex::new(Some(tx)),
            }),
            rx,
        )
    }

    /// Deliver `result`. Returns `false` when already resolved.
    pub fn resolve(&self, result: OpenResult) -> bool {
        let sender = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            // the receiver may be gone; the session still counts as resolved
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self.tx.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub kind: Option<String>,
    pub definition: Arc<ListerDefinition>,
    pub mode: Mode,
    pub confirm: bool,
    pub query: String,
    pub search_mode: SearchMode,
    pub search_target: SearchTarget,
    pub filters: Value,
    pub filters_patch: Value,
    pub effective_filters: Value,
    pub filters_spec: Option<Arc<FilterSpec>>,
    pub raw_list: Arc<Vec<Value>>,
    pub options_list: Arc<Vec<ListerOption>>,
    pub draft_value: DraftValue,
    pub initial_draft_value: DraftValue,
    pub loading: bool,
    pub refreshing: bool,
    pub error_code: Option<String>,
    /// True once a fetch has succeeded
    pub loaded: bool,
    pub on_change: Option<ChangeHandler>,
    pub completion: Arc<Completion>,
}

impl Session {
    pub fn option(&self, id: &OptionId) -> Option<&ListerOption> {
        self.options_list.iter().find(|o| &o.value == id)
    }

    pub fn is_busy(&self) -> bool {
        self.loading || self.refreshing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::{DetailAction, Reason};

    #[test]
    fn test_normalize_to_mode() {
        let multi =
            DraftValue::Multiple(vec![OptionId::Int(1), OptionId::Int(2), OptionId::Int(1)]);
        assert_eq!(
            multi.clone().normalize(Mode::Multiple),
            DraftValue::Multiple(vec![OptionId::Int(1), OptionId::Int(2)])
        );
        assert_eq!(multi.normalize(Mode::Single), DraftValue::Single(Some(OptionId::Int(1))));

        let single = DraftValue::Single(Some(OptionId::from("a")));
        assert_eq!(
            single.normalize(Mode::Multiple),
            DraftValue::Multiple(vec![OptionId::from("a")])
        );
        assert_eq!(
            DraftValue::Single(None).normalize(Mode::Multiple),
            DraftValue::Multiple(vec![])
        );
    }

    #[test]
    fn test_untagged_shape() {
        assert_eq!(serde_json::to_value(DraftValue::Single(None)).unwrap(), Value::Null);
        assert_eq!(
            serde_json::to_value(DraftValue::Multiple(vec![OptionId::Int(4)])).unwrap(),
            serde_json::json!([4])
        );
    }

    #[test]
    fn test_completion_fires_once() {
        let (completion, mut rx) = Completion::new();
        let result = OpenResult {
            reason: Reason::Apply,
            value: DraftValue::Single(None),
            details: Details::empty(Mode::Single, DetailAction::Apply),
        };

        assert!(!completion.is_resolved());
        assert!(completion.resolve(result.clone()));
        assert!(!completion.resolve(OpenResult {
            reason: Reason::Cancel,
            ..result.clone()
        }));
        assert!(completion.is_resolved());
        assert_eq!(rx.try_recv().unwrap(), result);
    }
}
