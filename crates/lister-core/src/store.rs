//! In-memory session store with change notification
//!
//! Every mutation swaps in a new [`StoreState`]. Subscribers receive the new `Arc`
//! and can detect change with `Arc::ptr_eq`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::session::{Session, SessionId};

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Open sessions in creation order
    pub order: Vec<SessionId>,
    pub active_id: Option<SessionId>,
    pub sessions: HashMap<SessionId, Arc<Session>>,
}

impl StoreState {
    pub fn session(&self, id: &SessionId) -> Option<&Arc<Session>> {
        self.sessions.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Append a session and make it active
    pub fn with_session(&self, session: Session) -> Self {
        let mut next = self.clone();
        let id = session.id.clone();
        if !next.order.contains(&id) {
            next.order.push(id.clone());
        }
        next.sessions.insert(id.clone(), Arc::new(session));
        next.active_id = Some(id);
        next
    }

    /// Replace an existing session, or `None` if it is gone
    pub fn with_updated(&self, id: &SessionId, update: impl FnOnce(&mut Session)) -> Option<Self> {
        let current = self.sessions.get(id)?;
        let mut session = Session::clone(current);
        update(&mut session);
        let mut next = self.clone();
        next.sessions.insert(id.clone(), Arc::new(session));
        Some(next)
    }

    /// Drop a session; the active pointer falls back to the newest remaining one
    pub fn without(&self, id: &SessionId) -> Option<(Self, Arc<Session>)> {
        let mut next = self.clone();
        let removed = next.sessions.remove(id)?;
        next.order.retain(|s| s != id);
        if next.active_id.as_ref() == Some(id) {
            next.active_id = next.order.last().cloned();
        }
        Some((next, removed))
    }

    pub fn with_active(&self, id: &SessionId) -> Option<Self> {
        if !self.sessions.contains_key(id) {
            return None;
        }
        let mut next = self.clone();
        next.active_id = Some(id.clone());
        Some(next)
    }
}

#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Arc<StoreState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(StoreState::default()));
        Self { tx }
    }

    /// Current state. Cheap; the returned `Arc` is never mutated.
    pub fn snapshot(&self) -> Arc<StoreState> {
        Arc::clone(&self.tx.borrow())
    }

    pub fn session(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.snapshot().session(id).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreState>> {
        self.tx.subscribe()
    }

    /// Compute the next state from the current one. Returning `None` leaves the
    /// store untouched and notifies nobody.
    pub fn update<T>(&self, f: impl FnOnce(&StoreState) -> Option<(StoreState, T)>) -> Option<T> {
        let mut output = None;
        self.tx.send_if_modified(|state| match f(&**state) {
            Some((next, value)) => {
                *state = Arc::new(next);
                output = Some(value);
                true
            }
            None => false,
        });
        output
    }

    /// Update one session in place of its previous copy; `false` if it is gone
    pub fn update_session(&self, id: &SessionId, update: impl FnOnce(&mut Session)) -> bool {
        self.update(|state| state.with_updated(id, update).map(|next| (next, ())))
            .is_some()
    }

    pub fn insert(&self, session: Session) {
        self.update(|state| Some((state.with_session(session), ())));
    }

    pub fn remove(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.update(|state| state.without(id))
    }

    pub fn focus(&self, id: &SessionId) -> bool {
        self.update(|state| state.with_active(id).map(|next| (next, ())))
            .is_some()
    }
}
