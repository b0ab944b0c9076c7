//! Public session actions. Every action addresses a session by id and is a
//! silent no-op (returning `false`) once that session has resolved.

use serde_json::{Map, Value};
use tracing::debug;

use super::ListerRuntime;
use crate::details::{DetailAction, Reason};
use crate::filters::{compute_effective_filters, index_filter_options};
use crate::inflight::RequestId;
use crate::option::OptionId;
use crate::search::SearchTarget;
use crate::session::{DraftValue, Mode, SessionId};

impl ListerRuntime {
    pub fn focus(&self, id: &SessionId) -> bool {
        self.inner.store.focus(id)
    }

    /// Dismiss the session. Confirming sessions revert to their initial value.
    pub fn close(&self, id: &SessionId) -> bool {
        self.resolve_and_dispose(id, Reason::Close, None)
    }

    pub fn cancel(&self, id: &SessionId) -> bool {
        self.resolve_and_dispose(id, Reason::Cancel, None)
    }

    pub fn apply(&self, id: &SessionId) -> bool {
        self.resolve_and_dispose(id, Reason::Apply, None)
    }

    pub fn clear(&self, id: &SessionId) -> bool {
        let Some(session) = self.inner.store.session(id) else {
            return false;
        };
        self.commit_draft(id, DraftValue::empty(session.mode), DetailAction::Clear)
    }

    pub fn select(&self, id: &SessionId, value: impl Into<OptionId>) -> bool {
        let value = value.into();
        let Some(session) = self.inner.store.session(id) else {
            return false;
        };
        if session.option(&value).is_some_and(|o| o.disabled) {
            debug!(session = %id, value = %value, "select_disabled");
            return false;
        }
        if session.draft_value.contains(&value) {
            return false;
        }

        let next = match session.mode {
            Mode::Single => DraftValue::Single(Some(value)),
            Mode::Multiple => {
                let mut ids = session.draft_value.ids().to_vec();
                ids.push(value);
                DraftValue::Multiple(ids)
            }
        };
        self.commit_draft(id, next, DetailAction::Select)
    }

    pub fn deselect(&self, id: &SessionId, value: impl Into<OptionId>) -> bool {
        let value = value.into();
        let Some(session) = self.inner.store.session(id) else {
            return false;
        };
        if !session.draft_value.contains(&value) {
            return false;
        }

        let next = without(&session.draft_value, &value, session.mode);
        self.commit_draft(id, next, DetailAction::Deselect)
    }

    /// Select if absent, otherwise remove. Re-clicking a single value clears it.
    pub fn toggle(&self, id: &SessionId, value: impl Into<OptionId>) -> bool {
        let value = value.into();
        let Some(session) = self.inner.store.session(id) else {
            return false;
        };

        if session.draft_value.contains(&value) {
            let (next, action) = match session.mode {
                Mode::Single => (DraftValue::Single(None), DetailAction::Clear),
                Mode::Multiple => (
                    without(&session.draft_value, &value, Mode::Multiple),
                    DetailAction::Deselect,
                ),
            };
            return self.commit_draft(id, next, action);
        }

        self.select(id, value)
    }

    /// Update the query; remote and hybrid sessions refetch after the debounce delay
    pub fn set_query(&self, id: &SessionId, query: impl Into<String>) -> bool {
        let query = query.into();
        let mut changed = false;
        let updated = self.inner.store.update_session(id, |s| {
            changed = s.query != query;
            s.query = query;
        });
        if !updated || !changed {
            return false;
        }
        self.refetch_for_search(id);
        true
    }

    pub fn set_search_target(&self, id: &SessionId, target: SearchTarget) -> bool {
        let mut changed = false;
        let updated = self.inner.store.update_session(id, |s| {
            changed = s.search_target != target;
            s.search_target = target;
        });
        if !updated || !changed {
            return false;
        }
        self.refetch_for_search(id);
        true
    }

    /// Replace the filter patch and refetch when auto-fetch is on
    pub fn set_filters_patch(&self, id: &SessionId, patch: Value) -> bool {
        let mut auto_fetch = true;
        let updated = self.inner.store.update_session(id, |s| {
            auto_fetch = s.filters_spec.as_ref().map_or(true, |spec| spec.auto_fetch);
            s.filters_patch = patch;
            s.effective_filters =
                compute_effective_filters(&s.filters, &s.filters_patch, s.filters_spec.as_deref());
        });
        if updated && auto_fetch {
            self.refresh_session(id);
        }
        updated
    }

    /// Shallow-merge `patch` into the current filter patch
    pub fn merge_filters_patch(&self, id: &SessionId, patch: Map<String, Value>) -> bool {
        let Some(session) = self.inner.store.session(id) else {
            return false;
        };
        let mut merged = match &session.filters_patch {
            Value::Object(current) => current.clone(),
            _ => Map::new(),
        };
        merged.extend(patch);
        self.set_filters_patch(id, Value::Object(merged))
    }

    /// Merge the patch contributed by a node of the session's filter tree.
    /// `input` is the live value for input nodes.
    pub fn apply_filter_option(&self, id: &SessionId, node_id: &str, input: Option<Value>) -> bool {
        let Some(session) = self.inner.store.session(id) else {
            return false;
        };
        let Some(spec) = session.filters_spec.as_deref() else {
            debug!(session = %id, node = node_id, "filter_option_without_spec");
            return false;
        };

        let index = index_filter_options(&spec.options);
        let Some(node) = index.get(node_id).filter(|n| !n.disabled) else {
            debug!(session = %id, node = node_id, "filter_option_unavailable");
            return false;
        };
        match node.patch(input.as_ref()) {
            Some(fragment) => self.merge_filters_patch(id, fragment),
            None => false,
        }
    }

    /// Refetch immediately, superseding anything pending
    pub fn refresh(&self, id: &SessionId) -> bool {
        self.refresh_session(id)
    }

    fn refetch_for_search(&self, id: &SessionId) {
        let Some(session) = self.inner.store.session(id) else {
            return;
        };
        if !session.search_mode.fetches_on_query() {
            return;
        }

        let runtime = self.clone();
        let owner = id.clone();
        self.inner
            .inflight
            .schedule(id, RequestId::generate(), async move {
                runtime.refresh_session(&owner);
            });
    }
}

fn without(draft: &DraftValue, value: &OptionId, mode: Mode) -> DraftValue {
    match mode {
        Mode::Single => DraftValue::Single(None),
        Mode::Multiple => DraftValue::Multiple(
            draft.ids().iter().filter(|id| *id != value).cloned().collect(),
        ),
    }
}
