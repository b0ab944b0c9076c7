//! The HTTP port the runtime fetches through
//!
//! The runtime only needs "send a request, get a body back". [`ReqwestHttpClient`]
//! is the default adapter; tests and embedders can plug in anything implementing
//! [`HttpPort`], including plain async closures.

mod reqwest_client;
mod signal;

use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};

use crate::definition::Method;
use crate::error::HttpError;

pub use reqwest_client::ReqwestHttpClient;
pub use signal::{CancelHandle, CancelSignal};

/// Everything a transport needs to perform one list request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub endpoint: String,
    pub method: Method,
    pub params: Map<String, Value>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub signal: Option<CancelSignal>,
    pub request_id: Option<String>,
}

impl HttpRequest {
    pub fn new(endpoint: impl Into<String>, method: Method) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            params: Map::new(),
            body: None,
            headers: Vec::new(),
            signal: None,
            request_id: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.as_ref().is_some_and(CancelSignal::is_cancelled)
    }
}

pub trait HttpPort: Send + Sync {
    fn send(&self, request: HttpRequest) -> BoxFuture<'static, Result<Value, HttpError>>;
}

impl<F, Fut> HttpPort for F
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HttpError>> + Send + 'static,
{
    fn send(&self, request: HttpRequest) -> BoxFuture<'static, Result<Value, HttpError>> {
        self(request).boxed()
    }
}

/// Flatten request params into query pairs.
///
/// Arrays repeat their key, objects are sent as JSON text, `null` is dropped.
pub fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    pairs.push((key.clone(), scalar_text(item)));
                }
            }
            other => pairs.push((key.clone(), scalar_text(other))),
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_pairs() {
        let params = json!({
            "status": "active",
            "ids": [1, 2, null],
            "skip": null,
            "nested": {"a": 1},
            "searchAll": true
        });
        let Value::Object(params) = params else {
            unreachable!()
        };

        let pairs = query_pairs(&params);

        assert!(pairs.contains(&("status".into(), "active".into())));
        assert!(pairs.contains(&("ids".into(), "1".into())));
        assert!(pairs.contains(&("ids".into(), "2".into())));
        assert!(pairs.contains(&("nested".into(), r#"{"a":1}"#.into())));
        assert!(pairs.contains(&("searchAll".into(), "true".into())));
        assert_eq!(pairs.len(), 5);
    }

    #[tokio::test]
    async fn test_closure_is_a_port() {
        let port =
            |req: HttpRequest| async move { Ok::<_, HttpError>(json!({"endpoint": req.endpoint})) };
        let body = port.send(HttpRequest::new("/users", Method::Get)).await.unwrap();
        assert_eq!(body["endpoint"], "/users");
    }
}
