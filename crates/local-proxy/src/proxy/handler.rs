//! Per-request routing.

use super::client::create_http_client;
use super::error::{handle_proxy_error, CommittedResponse, ForwardError, ResponseSlot};
use super::forwarding::{request_pathname, strip_api_prefix, HttpUpstream, Upstream};
use super::ProxyBody;
use crate::config::ProxyConfig;
use crate::dispatcher::{Dispatch, MockDispatcher};
use crate::response::JsonResponseBuilder;
use crate::store::ScenarioStore;
use anyhow::Context;
use http_body_util::BodyExt;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

/// Routes requests under the API prefix to the mock dispatcher and forwards
/// whatever it does not mock.
pub struct LocalProxy {
    api_prefix: String,
    dispatcher: MockDispatcher,
    upstream: Arc<dyn Upstream>,
}

impl LocalProxy {
    pub fn new(
        api_prefix: impl Into<String>,
        dispatcher: MockDispatcher,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            dispatcher,
            upstream,
        }
    }

    /// Wire the local store and the hyper upstream from process configuration.
    pub fn from_config(config: &ProxyConfig) -> anyhow::Result<Self> {
        let store = ScenarioStore::local(&config.base_dir);
        let dispatcher = MockDispatcher::new(
            store,
            config.scenarios_path.clone(),
            config.api_prefix.clone(),
        );
        let client = create_http_client(config.verify_tls)?;
        let upstream = HttpUpstream::new(client, &config.target, config.api_prefix.clone())
            .context("Failed to configure the upstream")?;

        Ok(Self::new(
            config.api_prefix.clone(),
            dispatcher,
            Arc::new(upstream),
        ))
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub async fn handle(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        let pathname = request_pathname(req.uri());
        let Some(relative) = strip_api_prefix(pathname, &self.api_prefix) else {
            return JsonResponseBuilder::new(StatusCode::NOT_FOUND)
                .json(&json!({ "error": "Not Found", "path": pathname }))
                .build_boxed();
        };

        let dispatch = self.dispatcher.dispatch(req.method(), relative).await;
        match dispatch {
            Dispatch::Mock(response) => response,
            Dispatch::Fallback => self.forward(req).await,
        }
    }

    /// Forward the original request and relay the upstream response.
    async fn forward(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        let url = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string();

        match self.upstream.forward(req).await {
            // The head is relayed as soon as it arrives; a failure while
            // streaming the body can only be logged.
            Ok(response) => response.map(|body| {
                body.map_err(move |e| {
                    handle_proxy_error(&ForwardError::from_error(&e), &url, &mut CommittedResponse);
                    e
                })
                .boxed()
            }),
            Err(err) => {
                let mut slot = ResponseSlot::new();
                handle_proxy_error(&err, &url, &mut slot);
                slot.into_response()
            }
        }
    }
}
