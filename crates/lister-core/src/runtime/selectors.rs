//! Read-only projections over the store

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use super::ListerRuntime;
use crate::details::{build_details, DetailAction, Details};
use crate::filters::compute_effective_filters;
use crate::option::ListerOption;
use crate::search::{LocalSearch, SearchMode};
use crate::session::{Session, SessionId};
use crate::store::StoreState;

impl ListerRuntime {
    pub fn session(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.inner.store.session(id)
    }

    pub fn active_session_id(&self) -> Option<SessionId> {
        self.inner.store.snapshot().active_id.clone()
    }

    /// Open sessions in creation order
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.inner.store.snapshot().order.clone()
    }

    /// Receive every new store snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreState>> {
        self.inner.store.subscribe()
    }

    pub fn effective_filters(&self, id: &SessionId) -> Option<Value> {
        let session = self.inner.store.session(id)?;
        Some(compute_effective_filters(
            &session.filters,
            &session.filters_patch,
            session.filters_spec.as_deref(),
        ))
    }

    /// Options to display. Local and hybrid sessions narrow the fetched list
    /// by the query; local sessions also apply the filter patch.
    pub fn visible_options(&self, id: &SessionId) -> Vec<ListerOption> {
        let Some(session) = self.inner.store.session(id) else {
            return Vec::new();
        };
        if !session.search_mode.filters_locally() {
            return session.options_list.to_vec();
        }

        let filters = (session.search_mode == SearchMode::Local).then_some(&session.filters_patch);
        let search = LocalSearch::new(
            &session.query,
            &session.search_target,
            session.definition.search.as_ref(),
        )
        .with_filters(filters);

        session
            .options_list
            .iter()
            .filter(|option| search.matches(&option.raw))
            .cloned()
            .collect()
    }

    /// Details describing the current draft
    pub fn details_payload(&self, id: &SessionId) -> Option<Details> {
        let session = self.inner.store.session(id)?;
        Some(
            build_details(
                session.mode,
                &session.draft_value,
                &session.options_list,
                DetailAction::Init,
            )
            .with_session(id.clone()),
        )
    }

    /// Wait until the session has no fetch pending or running. `None` once it
    /// has resolved.
    pub async fn settled(&self, id: &SessionId) -> Option<Arc<Session>> {
        let mut rx = self.inner.store.subscribe();
        loop {
            let current = rx.borrow_and_update().session(id).cloned();
            let session = current?;
            if !session.is_busy() && !self.inner.inflight.has_pending_timer(id) {
                return Some(session);
            }
            rx.changed().await.ok()?;
        }
    }
}
