//! Response Renderer: turns a resolved scenario into a JSON response.

use crate::proxy::ProxyBody;
use crate::response::{JsonResponseBuilder, APPLICATION_JSON};
use crate::store::ScenarioStore;
use bytes::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use local_proxy_lint::Scenario;
use serde_json::json;
use tracing::{error, warn};

/// A rendered mock, before headers are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub status: StatusCode,
    pub body: Bytes,
    pub content_type: &'static str,
}

impl Rendered {
    fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self {
            status,
            body: Bytes::from(value.to_string()),
            content_type: APPLICATION_JSON,
        }
    }

    pub fn into_response(self) -> Response<ProxyBody> {
        JsonResponseBuilder::new(self.status)
            .header(CONTENT_TYPE.as_str(), self.content_type)
            .raw(self.body)
            .build_boxed()
    }
}

/// Render `scenario`.
///
/// A fixture, when set, wins over the inline payload. A fixture that does
/// not exist is rendered as its own 500 rather than falling back to the
/// payload.
pub async fn render(store: &ScenarioStore, scenario: &Scenario) -> Rendered {
    let status = StatusCode::from_u16(scenario.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if let Some(file) = &scenario.fixture_path {
        return match store.fixture(file).await {
            Ok(Some(body)) => Rendered {
                status,
                body,
                content_type: APPLICATION_JSON,
            },
            Ok(None) => {
                warn!("Fixture not found: {}", store.resolve(file).display());
                Rendered::json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &json!({ "error": "Fixture not found", "file": file }),
                )
            }
            Err(e) => {
                error!("[MOCK ERROR] {e}");
                Rendered::json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &json!({
                        "error": "Failed to read fixture",
                        "file": file,
                        "message": e.to_string(),
                    }),
                )
            }
        };
    }

    let payload = scenario.payload.clone().unwrap_or_else(|| json!({}));
    Rendered::json(status, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryFs;
    use std::sync::Arc;

    fn store_with(files: &[(&str, &str)]) -> ScenarioStore {
        let fs = MemoryFs::new();
        for (path, contents) in files {
            fs.insert(format!("/base/{path}"), contents.to_string());
        }
        ScenarioStore::new(Arc::new(fs), "/base")
    }

    fn body_json(rendered: &Rendered) -> serde_json::Value {
        serde_json::from_slice(&rendered.body).unwrap()
    }

    #[tokio::test]
    async fn test_inline_payload() {
        let scenario = Scenario {
            payload: Some(json!({ "ok": true })),
            ..Default::default()
        };
        let rendered = render(&store_with(&[]), &scenario).await;
        assert_eq!(rendered.status, StatusCode::OK);
        assert_eq!(&rendered.body[..], br#"{"ok":true}"#);
        assert_eq!(rendered.content_type, "application/json");
    }

    #[tokio::test]
    async fn test_custom_status() {
        let scenario = Scenario {
            status: 500,
            payload: Some(json!({ "error": "Server Error" })),
            ..Default::default()
        };
        let rendered = render(&store_with(&[]), &scenario).await;
        assert_eq!(rendered.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&rendered), json!({ "error": "Server Error" }));
    }

    #[tokio::test]
    async fn test_fixture_served_verbatim() {
        let store = store_with(&[("fixtures/user.json", "{\n  \"id\": 1\n}\n")]);
        let scenario = Scenario {
            status: 202,
            fixture_path: Some("fixtures/user.json".to_string()),
            ..Default::default()
        };
        let rendered = render(&store, &scenario).await;
        assert_eq!(rendered.status, StatusCode::ACCEPTED);
        assert_eq!(&rendered.body[..], b"{\n  \"id\": 1\n}\n");
    }

    #[tokio::test]
    async fn test_fixture_wins_over_payload() {
        let store = store_with(&[("fixtures/a.json", r#"{"from":"file"}"#)]);
        let scenario = Scenario {
            payload: Some(json!({ "from": "inline" })),
            fixture_path: Some("fixtures/a.json".to_string()),
            ..Default::default()
        };
        let rendered = render(&store, &scenario).await;
        assert_eq!(body_json(&rendered), json!({ "from": "file" }));
    }

    #[tokio::test]
    async fn test_missing_fixture() {
        let scenario = Scenario {
            payload: Some(json!({ "ignored": true })),
            fixture_path: Some("fixtures/data.json".to_string()),
            ..Default::default()
        };
        let rendered = render(&store_with(&[]), &scenario).await;
        assert_eq!(rendered.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&rendered),
            json!({ "error": "Fixture not found", "file": "fixtures/data.json" })
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unstattable_fixture_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let looped = dir.path().join("loop.json");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();

        let scenario = Scenario {
            fixture_path: Some("loop.json".to_string()),
            ..Default::default()
        };
        let rendered = render(&ScenarioStore::local(dir.path()), &scenario).await;
        assert_eq!(rendered.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(&rendered);
        assert_eq!(body["error"], "Failed to read fixture");
        assert_eq!(body["file"], "loop.json");
    }

    #[tokio::test]
    async fn test_neither_body_source_renders_empty_object() {
        let rendered = render(&store_with(&[]), &Scenario::default()).await;
        assert_eq!(&rendered.body[..], b"{}");
    }

    #[tokio::test]
    async fn test_into_response() {
        let rendered = Rendered::json(StatusCode::NOT_FOUND, &json!({ "a": 1 }));
        let response = rendered.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(hyper::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
