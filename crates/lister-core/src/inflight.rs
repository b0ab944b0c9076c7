//! Per-session request bookkeeping
//!
//! Each session has at most one current request. Starting another (immediately
//! with [`InflightCoordinator::begin`] or debounced with
//! [`InflightCoordinator::schedule`]) cancels the previous one's transport signal
//! and pending timer. Completion handlers must check
//! [`InflightCoordinator::is_latest`] before writing results.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::trace;

use crate::http::{CancelHandle, CancelSignal};
use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug)]
struct InflightEntry {
    request_id: RequestId,
    cancel: Option<CancelHandle>,
    debounce: Option<AbortHandle>,
}

impl InflightEntry {
    fn cancel(self) {
        if let Some(cancel) = self.cancel {
            cancel.cancel();
        }
        if let Some(timer) = self.debounce {
            timer.abort();
        }
    }
}

#[derive(Debug)]
pub struct InflightCoordinator {
    entries: Mutex<HashMap<SessionId, InflightEntry>>,
    debounce: Duration,
}

impl InflightCoordinator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            debounce,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<SessionId, InflightEntry>> {
        // entries stay consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record `request_id` as current and hand back its cancellation signal
    pub fn begin(&self, session: &SessionId, request_id: RequestId) -> CancelSignal {
        let (handle, signal) = CancelHandle::new();
        trace!(session = %session, request = %request_id, "inflight_begin");
        let previous = self.entries().insert(
            session.clone(),
            InflightEntry {
                request_id,
                cancel: Some(handle),
                debounce: None,
            },
        );
        if let Some(previous) = previous {
            previous.cancel();
        }
        signal
    }

    /// Record `request_id` as current and run `task` after the debounce delay,
    /// unless something newer arrives first.
    pub fn schedule<F>(self: &Arc<Self>, session: &SessionId, request_id: RequestId, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let coordinator = Arc::clone(self);
        let delay = self.debounce;
        let owner = session.clone();
        let scheduled = request_id.clone();

        let previous = {
            let mut entries = self.entries();
            let timer = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if coordinator.fire(&owner, &scheduled) {
                    task.await;
                }
            });
            trace!(session = %session, request = %request_id, "inflight_schedule");
            entries.insert(
                session.clone(),
                InflightEntry {
                    request_id,
                    cancel: None,
                    debounce: Some(timer.abort_handle()),
                },
            )
        };
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    /// Timer expiry: detach the timer so the task can start its own request
    fn fire(&self, session: &SessionId, request_id: &RequestId) -> bool {
        match self.entries().get_mut(session) {
            Some(entry) if &entry.request_id == request_id => {
                entry.debounce = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_latest(&self, session: &SessionId, request_id: &RequestId) -> bool {
        self.entries()
            .get(session)
            .is_some_and(|entry| &entry.request_id == request_id)
    }

    pub fn current(&self, session: &SessionId) -> Option<RequestId> {
        self.entries().get(session).map(|e| e.request_id.clone())
    }

    pub fn has_pending_timer(&self, session: &SessionId) -> bool {
        self.entries()
            .get(session)
            .is_some_and(|entry| entry.debounce.is_some())
    }

    /// Cancel and forget the session's request
    pub fn clear(&self, session: &SessionId) {
        let previous = self.entries().remove(session);
        if let Some(previous) = previous {
            trace!(session = %session, request = %previous.request_id, "inflight_clear");
            previous.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn coordinator() -> Arc<InflightCoordinator> {
        Arc::new(InflightCoordinator::new(Duration::from_millis(250)))
    }

    #[tokio::test]
    async fn test_begin_cancels_previous() {
        let inflight = coordinator();
        let session = SessionId::from("s");

        let first = inflight.begin(&session, RequestId::from("r1"));
        assert!(inflight.is_latest(&session, &RequestId::from("r1")));

        let second = inflight.begin(&session, RequestId::from("r2"));
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!inflight.is_latest(&session, &RequestId::from("r1")));
        assert!(inflight.is_latest(&session, &RequestId::from("r2")));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let inflight = coordinator();
        let a = inflight.begin(&SessionId::from("a"), RequestId::from("r1"));
        inflight.begin(&SessionId::from("b"), RequestId::from("r2"));

        assert!(!a.is_cancelled());
        assert!(inflight.is_latest(&SessionId::from("a"), &RequestId::from("r1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_collapses_to_last() {
        let inflight = coordinator();
        let session = SessionId::from("s");
        let runs = Arc::new(AtomicUsize::new(0));

        for i in 0..5 {
            let runs = Arc::clone(&runs);
            inflight.schedule(&session, RequestId::from(format!("r{i}").as_str()), async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(inflight.has_pending_timer(&session));

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(inflight.is_latest(&session, &RequestId::from("r4")));
        assert!(!inflight.has_pending_timer(&session));
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_clears_pending_timer() {
        let inflight = coordinator();
        let session = SessionId::from("s");
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        inflight.schedule(&session, RequestId::from("r1"), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        inflight.begin(&session, RequestId::from("r2"));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_everything() {
        let inflight = coordinator();
        let session = SessionId::from("s");
        let signal = inflight.begin(&session, RequestId::from("r1"));

        inflight.clear(&session);

        assert!(signal.is_cancelled());
        assert_eq!(inflight.current(&session), None);
        inflight.clear(&session);
    }
}
