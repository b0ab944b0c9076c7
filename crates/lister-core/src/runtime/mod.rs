//! Session runtime
//!
//! [`ListerRuntime`] owns the store, the in-flight coordinator and the fetch
//! pipeline, and exposes the public action and selector surface. Every session
//! moves through `opening -> loading -> ready` and leaves through
//! [`ListerRuntime::resolve_and_dispose`], which settles its `open` future once.

mod actions;
mod selectors;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::RuntimeConfig;
use crate::definition::ListerDefinition;
use crate::details::{build_details, DetailAction, Details, OpenResult, Reason};
use crate::error::{ListerError, Result};
use crate::fetch::{FetchOptions, FetchOutcome, FetchPipeline};
use crate::filters::{compute_effective_filters, FilterSpec};
use crate::http::{CancelSignal, HttpPort, ReqwestHttpClient};
use crate::inflight::{InflightCoordinator, RequestId};
use crate::log_runtime_metrics;
use crate::logging::RuntimeMetrics;
use crate::option::ListerOption;
use crate::permission::{can_open, AllowAll, Host, PermissionContext};
use crate::preset::PresetRegistry;
use crate::search::{SearchMode, SearchPayload, SearchTarget};
use crate::session::{ChangeEvent, ChangeHandler, Completion, DraftValue, Mode, Session, SessionId};
use crate::store::SessionStore;

/// A definition given directly or by preset name
#[derive(Debug, Clone)]
pub enum ListerTarget {
    Kind(String),
    Definition(Arc<ListerDefinition>),
}

impl From<&str> for ListerTarget {
    fn from(kind: &str) -> Self {
        ListerTarget::Kind(kind.to_string())
    }
}

impl From<String> for ListerTarget {
    fn from(kind: String) -> Self {
        ListerTarget::Kind(kind)
    }
}

impl From<ListerDefinition> for ListerTarget {
    fn from(def: ListerDefinition) -> Self {
        ListerTarget::Definition(Arc::new(def))
    }
}

impl From<Arc<ListerDefinition>> for ListerTarget {
    fn from(def: Arc<ListerDefinition>) -> Self {
        ListerTarget::Definition(def)
    }
}

/// Options recognised by [`ListerRuntime::open`]
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub mode: Mode,
    /// Require an explicit apply; always on for multiple mode
    pub confirm: bool,
    pub default_value: Option<DraftValue>,
    /// `!`-suffixed entries are mandatory
    pub permissions: Vec<String>,
    pub search_mode: SearchMode,
    pub search_target: SearchTarget,
    pub initial_query: Option<String>,
    pub filters_spec: Option<FilterSpec>,
    pub on_change: Option<ChangeHandler>,
}

impl OpenOptions {
    pub fn single() -> Self {
        Self::default()
    }

    pub fn multiple() -> Self {
        Self {
            mode: Mode::Multiple,
            ..Self::default()
        }
    }

    pub fn with_confirm(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_default(mut self, value: impl Into<DraftValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.initial_query = Some(query.into());
        self
    }

    pub fn with_filters_spec(mut self, spec: FilterSpec) -> Self {
        self.filters_spec = Some(spec);
        self
    }

    pub fn with_on_change(mut self, handler: ChangeHandler) -> Self {
        self.on_change = Some(handler);
        self
    }
}

/// Returned by `open`; resolves when the session ends
#[derive(Debug)]
pub struct OpenHandle {
    session_id: Option<SessionId>,
    mode: Mode,
    rx: oneshot::Receiver<OpenResult>,
}

impl OpenHandle {
    /// `None` when the session was refused before it was created
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub async fn wait(self) -> OpenResult {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => OpenResult {
                reason: Reason::Error,
                value: DraftValue::empty(self.mode),
                details: Details::empty(self.mode, DetailAction::Error)
                    .with_error_code(Some("session_dropped".to_string())),
            },
        }
    }
}

/// Options for a stateless [`ListerRuntime::fetch`]
#[derive(Debug, Clone, Default)]
pub struct FetchQuery {
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub raw: Vec<Value>,
    pub options: Vec<ListerOption>,
}

#[derive(Default)]
pub struct RuntimeBuilder {
    http: Option<Arc<dyn HttpPort>>,
    host: Option<Arc<dyn Host>>,
    config: RuntimeConfig,
    presets: Vec<(String, ListerDefinition)>,
}

impl RuntimeBuilder {
    pub fn http(mut self, http: Arc<dyn HttpPort>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn host(mut self, host: Arc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn preset(mut self, kind: impl Into<String>, definition: ListerDefinition) -> Self {
        self.presets.push((kind.into(), definition));
        self
    }

    pub fn build(self) -> Result<ListerRuntime> {
        let http = self.http.ok_or(ListerError::HttpClientMissing)?;
        let presets = PresetRegistry::new();
        for (kind, definition) in self.presets {
            presets.register(kind, definition);
        }

        Ok(ListerRuntime {
            inner: Arc::new(RuntimeInner {
                pipeline: FetchPipeline::new(http),
                host: self.host.unwrap_or_else(|| Arc::new(AllowAll)),
                presets,
                store: SessionStore::new(),
                inflight: Arc::new(InflightCoordinator::new(self.config.debounce())),
                metrics: RuntimeMetrics::new(),
                config: self.config,
            }),
        })
    }
}

struct RuntimeInner {
    pipeline: FetchPipeline,
    host: Arc<dyn Host>,
    presets: PresetRegistry,
    store: SessionStore,
    inflight: Arc<InflightCoordinator>,
    metrics: RuntimeMetrics,
    config: RuntimeConfig,
}

/// Cheap to clone; all clones share the same sessions
#[derive(Clone)]
pub struct ListerRuntime {
    inner: Arc<RuntimeInner>,
}

impl ListerRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    /// Runtime using the reqwest transport configured by `config.http`
    pub fn with_default_http(config: RuntimeConfig) -> Result<Self> {
        let http = ReqwestHttpClient::new(config.http.clone())?;
        Self::builder().http(Arc::new(http)).config(config).build()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &RuntimeMetrics {
        &self.inner.metrics
    }

    pub fn register_preset(&self, kind: impl Into<String>, definition: ListerDefinition) {
        self.inner.presets.register(kind, definition);
    }

    pub fn preset(&self, kind: &str) -> Option<Arc<ListerDefinition>> {
        self.inner.presets.get(kind)
    }

    pub fn preset_kinds(&self) -> Vec<String> {
        self.inner.presets.kinds()
    }

    fn resolve_target(
        &self,
        target: ListerTarget,
    ) -> Result<(Option<String>, Arc<ListerDefinition>)> {
        match target {
            ListerTarget::Kind(kind) => match self.inner.presets.get(&kind) {
                Some(def) => Ok((Some(kind), def)),
                None => Err(ListerError::preset_not_found(kind)),
            },
            ListerTarget::Definition(def) => Ok((None, def)),
        }
    }

    /// One-shot fetch that does not create a session
    pub async fn fetch(
        &self,
        target: impl Into<ListerTarget>,
        filters: Value,
        query: FetchQuery,
    ) -> Result<FetchResult> {
        let (_, definition) = self.resolve_target(target.into())?;
        let outcome = self
            .inner
            .pipeline
            .run(
                &definition,
                &filters,
                FetchOptions {
                    query: &query.query,
                    request_id: Some(RequestId::generate()),
                    ..FetchOptions::default()
                },
            )
            .await?;

        Ok(FetchResult {
            raw: outcome.raw_list,
            options: outcome.options_list,
        })
    }

    /// Start a session. Must be called from within a tokio runtime.
    pub fn open(
        &self,
        target: impl Into<ListerTarget>,
        filters: Value,
        opts: OpenOptions,
    ) -> OpenHandle {
        let mode = opts.mode;
        let seed = opts
            .default_value
            .clone()
            .map_or_else(|| DraftValue::empty(mode), |value| value.normalize(mode));
        let (completion, rx) = Completion::new();

        let (kind, definition) = match self.resolve_target(target.into()) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(error = %err, "open_failed");
                completion.resolve(OpenResult {
                    reason: Reason::Error,
                    details: Details::empty(mode, DetailAction::Error)
                        .with_error_code(Some(err.code().to_string())),
                    value: seed,
                });
                return OpenHandle {
                    session_id: None,
                    mode,
                    rx,
                };
            }
        };

        let permission_ctx = PermissionContext {
            kind: kind.as_deref(),
            filters: &filters,
        };
        if !can_open(self.inner.host.as_ref(), &opts.permissions, &permission_ctx) {
            debug!(kind = kind.as_deref().unwrap_or("-"), "open_denied");
            self.host_log(&format!("open denied for {}", kind.as_deref().unwrap_or("definition")));
            completion.resolve(OpenResult {
                reason: Reason::Denied,
                details: Details::empty(mode, DetailAction::Denied)
                    .with_error_code(Some(ListerError::AccessDenied.code().to_string())),
                value: seed,
            });
            return OpenHandle {
                session_id: None,
                mode,
                rx,
            };
        }

        let id = SessionId::generate();
        let filters_spec = opts.filters_spec.map(Arc::new);
        let filters_patch = Value::Null;
        let effective_filters =
            compute_effective_filters(&filters, &filters_patch, filters_spec.as_deref());

        self.inner.store.insert(Session {
            id: id.clone(),
            kind,
            definition,
            mode,
            confirm: mode == Mode::Multiple || opts.confirm,
            query: opts.initial_query.unwrap_or_default(),
            search_mode: opts.search_mode,
            search_target: opts.search_target,
            filters,
            filters_patch,
            effective_filters,
            filters_spec,
            raw_list: Arc::new(Vec::new()),
            options_list: Arc::new(Vec::new()),
            draft_value: seed.clone(),
            initial_draft_value: seed,
            loading: false,
            refreshing: false,
            error_code: None,
            loaded: false,
            on_change: opts.on_change,
            completion,
        });
        debug!(session = %id, ?mode, "session_opened");
        self.host_log(&format!("session {id} opened"));

        self.refresh_session(&id);

        OpenHandle {
            session_id: Some(id),
            mode,
            rx,
        }
    }

    /// Start a fetch for the session, superseding any earlier one
    pub(crate) fn refresh_session(&self, id: &SessionId) -> bool {
        let store = &self.inner.store;
        if store.session(id).is_none() {
            return false;
        }

        let request_id = RequestId::generate();
        let signal = self.inner.inflight.begin(id, request_id.clone());

        let updated = store.update_session(id, |s| {
            s.loading = !s.loaded;
            s.refreshing = s.loaded;
            s.effective_filters =
                compute_effective_filters(&s.filters, &s.filters_patch, s.filters_spec.as_deref());
        });
        let Some(session) = store.session(id).filter(|_| updated) else {
            self.inner.inflight.clear(id);
            return false;
        };

        self.inner.metrics.record_started();
        let runtime = self.clone();
        tokio::spawn(async move {
            let remote = session.search_mode.fetches_on_query();
            let payload = SearchPayload::from_target(&session.search_target);
            let result = runtime
                .inner
                .pipeline
                .run(
                    &session.definition,
                    &session.effective_filters,
                    FetchOptions {
                        query: if remote { session.query.as_str() } else { "" },
                        cursor: None,
                        search: remote.then_some(&payload),
                        signal: Some(signal.clone()),
                        request_id: Some(request_id.clone()),
                    },
                )
                .await;
            runtime.finish_fetch(&session.id, &request_id, &signal, result);
        });
        true
    }

    fn finish_fetch(
        &self,
        id: &SessionId,
        request_id: &RequestId,
        signal: &CancelSignal,
        result: Result<FetchOutcome>,
    ) {
        let metrics = &self.inner.metrics;
        if !self.inner.inflight.is_latest(id, request_id) {
            debug!(session = %id, request = %request_id, "fetch_stale");
            if signal.is_cancelled() {
                metrics.record_cancelled();
            } else {
                metrics.record_stale();
            }
            return;
        }

        match result {
            Ok(outcome) => {
                debug!(session = %id, options = outcome.options_list.len(), "fetch_applied");
                metrics.record_applied();
                self.inner.store.update_session(id, |s| {
                    s.raw_list = Arc::new(outcome.raw_list);
                    s.options_list = Arc::new(outcome.options_list);
                    s.loading = false;
                    s.refreshing = false;
                    s.loaded = true;
                    s.error_code = None;
                });
            }
            Err(err) if signal.is_cancelled() || err.is_aborted() => {
                debug!(session = %id, "fetch_cancelled");
                metrics.record_cancelled();
                self.inner.store.update_session(id, |s| {
                    s.loading = false;
                    s.refreshing = false;
                });
            }
            Err(err) => {
                warn!(session = %id, error = %err, "fetch_failed");
                metrics.record_failed();
                self.inner.store.update_session(id, |s| {
                    s.loading = false;
                    s.refreshing = false;
                    s.error_code = Some(err.code().to_string());
                });
            }
        }
    }

    /// Write a new draft unless `on_change` prevents it. Single, non-confirming
    /// sessions resolve right away on `select` and `clear`.
    ///
    /// If `on_change` re-enters the runtime and changes the draft itself, that
    /// change stands and this one is dropped.
    pub(crate) fn commit_draft(
        &self,
        id: &SessionId,
        next: DraftValue,
        action: DetailAction,
    ) -> bool {
        let Some(session) = self.inner.store.session(id) else {
            return false;
        };
        let next = next.normalize(session.mode);

        if let Some(handler) = &session.on_change {
            let details = build_details(session.mode, &next, &session.options_list, action)
                .with_session(id.clone());
            let mut event = ChangeEvent::default();
            let outcome =
                catch_unwind(AssertUnwindSafe(|| handler.call(&next, &details, &mut event)));
            if outcome.is_err() {
                warn!(session = %id, ?action, "on_change panicked; change dropped");
                return false;
            }
            if event.is_default_prevented() {
                debug!(session = %id, ?action, "change_prevented");
                return false;
            }
        }

        let written = self.inner.store.update(|state| {
            let current = state.session(id)?;
            if current.draft_value != session.draft_value {
                return None;
            }
            state
                .with_updated(id, |s| s.draft_value = next)
                .map(|state| (state, ()))
        });
        if written.is_none() {
            debug!(session = %id, ?action, "change_superseded");
            return false;
        }

        if session.mode == Mode::Single
            && !session.confirm
            && matches!(action, DetailAction::Select | DetailAction::Clear)
        {
            self.resolve_and_dispose(id, Reason::Apply, None);
        }
        true
    }

    /// Settle the session's `open` future and drop it. No-op for unknown sessions.
    pub(crate) fn resolve_and_dispose(
        &self,
        id: &SessionId,
        reason: Reason,
        error_code: Option<String>,
    ) -> bool {
        let Some(session) = self.inner.store.remove(id) else {
            return false;
        };
        self.inner.inflight.clear(id);

        let revert = match reason {
            Reason::Cancel => true,
            Reason::Close => session.confirm,
            _ => false,
        };
        let value = if revert {
            session.initial_draft_value.clone()
        } else {
            session.draft_value.clone()
        };
        let details = build_details(session.mode, &value, &session.options_list, reason.into())
            .with_session(id.clone())
            .with_error_code(error_code);

        if !session.completion.resolve(OpenResult {
            reason,
            value,
            details,
        }) {
            warn!(session = %id, "session already resolved");
        }
        debug!(session = %id, ?reason, "session_resolved");
        self.host_log(&format!("session {id} resolved: {reason:?}"));
        log_runtime_metrics!(self.inner.metrics, "session_resolved");
        true
    }

    fn host_log(&self, message: &str) {
        let host = &self.inner.host;
        if catch_unwind(AssertUnwindSafe(|| host.log(message))).is_err() {
            warn!("host log hook panicked");
        }
    }
}
