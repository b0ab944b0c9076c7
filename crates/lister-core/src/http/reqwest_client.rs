//! Default HTTP port backed by reqwest

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;

use super::{query_pairs, HttpPort, HttpRequest};
use crate::config::HttpConfig;
use crate::definition::Method;
use crate::error::{HttpError, ListerError, Result};

#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    config: HttpConfig,
    user_agent: String,
}

impl ReqwestHttpClient {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ListerError::Other(format!("failed to build HTTP client: {e}")))?;
        let user_agent = format!("lister/{}", env!("CARGO_PKG_VERSION"));

        Ok(Self {
            client,
            config,
            user_agent,
        })
    }

    /// Resolve `endpoint` against the configured base URL
    pub fn url_for(&self, endpoint: &str) -> std::result::Result<String, HttpError> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Ok(endpoint.to_string());
        }
        match &self.config.base_url {
            Some(base) => Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            )),
            None => Err(HttpError::Transport(format!(
                "relative endpoint {endpoint} requires a base URL"
            ))),
        }
    }

    fn execute(
        &self,
        request: HttpRequest,
    ) -> BoxFuture<'static, std::result::Result<Value, HttpError>> {
        let url = self.url_for(&request.endpoint);
        let client = self.client.clone();
        let user_agent = self.user_agent.clone();
        let request_id_header = self.config.request_id_header.clone();

        async move {
            let url = url?;
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Patch => reqwest::Method::PATCH,
                Method::Delete => reqwest::Method::DELETE,
            };

            let mut builder = client
                .request(method, &url)
                .header("User-Agent", user_agent)
                .header("Accept", "application/json")
                .query(&query_pairs(&request.params));
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(id) = &request.request_id {
                builder = builder.header(request_id_header.as_str(), id.as_str());
            }

            debug!(url = %url, method = request.method.as_str(), "http_request");

            let response = builder
                .send()
                .await
                .map_err(|e| HttpError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(HttpError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| HttpError::Decode(e.to_string()))
        }
        .boxed()
    }
}

impl HttpPort for ReqwestHttpClient {
    fn send(
        &self,
        request: HttpRequest,
    ) -> BoxFuture<'static, std::result::Result<Value, HttpError>> {
        let signal = request.signal.clone();
        let call = self.execute(request);

        async move {
            match signal {
                Some(signal) => {
                    // dropping `call` aborts the underlying request
                    tokio::select! {
                        result = call => result,
                        _ = signal.cancelled() => Err(HttpError::Aborted),
                    }
                }
                None => call.await,
            }
        }
        .boxed()
    }
}
