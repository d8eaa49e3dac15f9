//! Mock Dispatcher: load, match and render, or hand the request back.

use crate::matcher::match_rule;
use crate::proxy::headers::{HeadersExt, VALUE_TRUE, X_LOCAL_PROXY_MOCKED, X_LOCAL_PROXY_SCENARIO};
use crate::proxy::ProxyBody;
use crate::render::render;
use crate::response::JsonResponseBuilder;
use crate::store::ScenarioStore;
use hyper::{Method, Response, StatusCode};
use serde_json::json;
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Outcome of dispatching one request.
#[derive(Debug)]
pub enum Dispatch {
    /// Answer with this response; the upstream is not contacted.
    Mock(Response<ProxyBody>),
    /// No rule applies; forward the request.
    Fallback,
}

impl Dispatch {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Dispatch::Fallback)
    }
}

#[derive(Debug, Clone)]
pub struct MockDispatcher {
    store: ScenarioStore,
    scenarios_path: PathBuf,
    api_prefix: String,
}

impl MockDispatcher {
    /// `api_prefix` is only used to log the full request path.
    pub fn new(
        store: ScenarioStore,
        scenarios_path: impl Into<PathBuf>,
        api_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            scenarios_path: scenarios_path.into(),
            api_prefix: api_prefix.into(),
        }
    }

    /// Decide how to answer `method path`, where `path` is relative to the
    /// API prefix.
    ///
    /// The scenarios file is re-read on every call. A broken file answers 500
    /// instead of falling through, so the breakage is visible. Dropping the
    /// returned future abandons any pending delay.
    pub async fn dispatch(&self, method: &Method, path: &str) -> Dispatch {
        let file = match self.store.load(&self.scenarios_path).await {
            Ok(file) => file,
            Err(e) => {
                error!("[MOCK ERROR] {e}");
                let response = JsonResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .json(&json!({
                        "error": "Failed to load scenarios",
                        "message": e.to_string(),
                    }))
                    .build_boxed();
                return Dispatch::Mock(response);
            }
        };

        let Some(matched) = match_rule(&file.rules, method.as_str(), path) else {
            return Dispatch::Fallback;
        };
        let resolved_at = Instant::now();

        info!(
            "[MOCKED] {} {} -> {}",
            method,
            self.full_path(path),
            matched.scenario_name
        );

        let rendered = render(&self.store, matched.scenario).await;

        if let Some(delay) = matched.scenario.delay() {
            match resolved_at.checked_add(delay) {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => tokio::time::sleep(delay).await,
            }
        }

        let mut response = rendered.into_response();
        response.set_header(&X_LOCAL_PROXY_MOCKED, &VALUE_TRUE);
        if !response.set_header_value(&X_LOCAL_PROXY_SCENARIO, matched.scenario_name) {
            debug!(
                "Scenario name {:?} is not a valid header value, omitting {}",
                matched.scenario_name, X_LOCAL_PROXY_SCENARIO
            );
        }
        Dispatch::Mock(response)
    }

    fn full_path(&self, path: &str) -> String {
        if self.api_prefix == "/" {
            path.to_string()
        } else {
            format!("{}{}", self.api_prefix, path)
        }
    }
}
