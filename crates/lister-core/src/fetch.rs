//! Request building, transport call, extraction and mapping in one pass

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::debug;

use crate::definition::{ListerDefinition, MapContext, RequestContext};
use crate::error::Result;
use crate::extract::extract;
use crate::http::{CancelSignal, HttpPort, HttpRequest};
use crate::inflight::RequestId;
use crate::mapper::map_options;
use crate::option::ListerOption;
use crate::search::SearchPayload;
use crate::trace_time;

#[derive(Debug, Clone, Default)]
pub struct FetchOptions<'a> {
    pub query: &'a str,
    pub cursor: Option<&'a Value>,
    pub search: Option<&'a SearchPayload>,
    pub signal: Option<CancelSignal>,
    pub request_id: Option<RequestId>,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub raw_list: Vec<Value>,
    pub options_list: Vec<ListerOption>,
    pub response_body: Value,
    pub request_id: Option<RequestId>,
}

pub struct FetchPipeline {
    http: Arc<dyn HttpPort>,
}

impl FetchPipeline {
    pub fn new(http: Arc<dyn HttpPort>) -> Self {
        Self { http }
    }

    /// Assemble the transport request for `def`
    pub fn build_request(
        def: &ListerDefinition,
        filters: &Value,
        opts: &FetchOptions<'_>,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(def.source.endpoint.clone(), def.source.method);

        match &def.source.build_request {
            Some(builder) => {
                let built = builder.build(&RequestContext {
                    filters,
                    query: opts.query,
                    cursor: opts.cursor,
                });
                request.params = built.params.unwrap_or_default();
                request.body = built.body;
                request.headers = built.headers;
            }
            None => {
                request.params = default_params(filters, opts.query);
            }
        }

        if let Some(search) = opts.search {
            search.merge_into(&mut request.params);
        }
        request.signal = opts.signal.clone();
        request.request_id = opts.request_id.as_ref().map(|id| id.to_string());
        request
    }

    pub async fn run(
        &self,
        def: &ListerDefinition,
        filters: &Value,
        opts: FetchOptions<'_>,
    ) -> Result<FetchOutcome> {
        let start = Instant::now();
        let request = Self::build_request(def, filters, &opts);
        debug!(
            endpoint = %request.endpoint,
            request_id = request.request_id.as_deref().unwrap_or("-"),
            "fetch_start"
        );

        let response_body = self.http.send(request).await?;
        trace_time!(start, "fetch_response");

        let raw_list = extract(&response_body, def.selector.as_ref())?;
        let options_list = map_options(
            &raw_list,
            &def.mapping,
            &MapContext {
                filters,
                query: opts.query,
            },
        );
        trace_time!(start, "fetch_mapped", records = raw_list.len(), options = options_list.len());

        Ok(FetchOutcome {
            raw_list,
            options_list,
            response_body,
            request_id: opts.request_id,
        })
    }
}

fn default_params(filters: &Value, query: &str) -> Map<String, Value> {
    let mut params = match filters {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    if !query.is_empty() {
        params.insert("search".to_string(), Value::from(query));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{BuiltRequest, Mapping, Method, RequestBuilder, Resolver, Source};
    use crate::error::{HttpError, ListerError};
    use crate::search::SearchTarget;
    use serde_json::json;
    use std::sync::Mutex;

    fn users() -> ListerDefinition {
        ListerDefinition::new(
            Source::get("/users"),
            Mapping::new(Resolver::path("id")).with_label(Resolver::path("name")),
        )
    }

    #[test]
    fn test_default_request_shape() {
        let search = SearchPayload::from_target(&SearchTarget::Subject {
            subject: "email".into(),
        });
        let opts = FetchOptions {
            query: "ada",
            search: Some(&search),
            request_id: Some(RequestId::from("r1")),
            ..FetchOptions::default()
        };

        let request = FetchPipeline::build_request(&users(), &json!({"team": 3}), &opts);

        assert_eq!(request.method, Method::Get);
        assert_eq!(
            Value::Object(request.params),
            json!({"team": 3, "search": "ada", "subject": "email"})
        );
        assert_eq!(request.request_id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_custom_request_builder() {
        let def = ListerDefinition {
            source: Source::get("/search")
                .with_method(Method::Post)
                .with_request_builder(RequestBuilder::new(|ctx| BuiltRequest {
                    params: None,
                    body: Some(json!({"where": ctx.filters, "q": ctx.query})),
                    headers: vec![("X-Tenant".into(), "acme".into())],
                })),
            ..users()
        };
        let search = SearchPayload::from_target(&SearchTarget::All);
        let opts = FetchOptions {
            query: "x",
            search: Some(&search),
            ..FetchOptions::default()
        };

        let request = FetchPipeline::build_request(&def, &json!({"a": 1}), &opts);

        assert_eq!(request.body, Some(json!({"where": {"a": 1}, "q": "x"})));
        assert_eq!(Value::Object(request.params), json!({"searchAll": true}));
        assert_eq!(request.headers, vec![("X-Tenant".to_string(), "acme".to_string())]);
    }

    #[tokio::test]
    async fn test_run_extracts_and_maps() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let port = move |req: HttpRequest| {
            log.lock().unwrap().push(req.endpoint.clone());
            let body = json!({"data": [{"id": 1, "name": "Ada"}, {"name": "skip"}]});
            async move { Ok::<_, HttpError>(body) }
        };
        let pipeline = FetchPipeline::new(Arc::new(port));

        let outcome = pipeline
            .run(&users(), &Value::Null, FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.raw_list.len(), 2);
        assert_eq!(outcome.options_list.len(), 1);
        assert_eq!(outcome.options_list[0].label, "Ada");
        assert_eq!(*seen.lock().unwrap(), vec!["/users".to_string()]);
    }

    #[tokio::test]
    async fn test_run_surfaces_errors() {
        let failing = FetchPipeline::new(Arc::new(|_req: HttpRequest| async {
            Err::<Value, _>(HttpError::Transport("connection refused".into()))
        }));
        let err = failing
            .run(&users(), &Value::Null, FetchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "fetch_failed");

        let shapeless = FetchPipeline::new(Arc::new(|_req: HttpRequest| async {
            Ok::<_, HttpError>(json!({"foo": 1}))
        }));
        let err = shapeless
            .run(&users(), &Value::Null, FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ListerError::ExtractNotArray { .. }));
    }
}
