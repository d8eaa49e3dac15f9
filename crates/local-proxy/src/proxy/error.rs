//! Upstream transport failures and how they become 502 responses.

use super::ProxyBody;
use crate::response::JsonResponseBuilder;
use hyper::{Response, StatusCode};
use serde_json::{json, Value};
use std::error::Error as StdError;
use std::io;
use tracing::error;

/// A failed attempt to reach the upstream or to relay its response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ForwardError {
    /// Socket-level error code such as `ECONNREFUSED`, when one is known.
    pub code: Option<String>,
    pub message: String,
}

impl ForwardError {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    /// Describe `err` using its whole source chain; the code comes from the
    /// innermost [`io::Error`].
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut parts = vec![err.to_string()];
        let mut code = err.downcast_ref::<io::Error>().and_then(io_error_code);

        let mut source = err.source();
        while let Some(inner) = source {
            let text = inner.to_string();
            if parts.last() != Some(&text) {
                parts.push(text);
            }
            if let Some(inner_code) = inner.downcast_ref::<io::Error>().and_then(io_error_code) {
                code = Some(inner_code);
            }
            source = inner.source();
        }

        Self {
            code: code.map(str::to_string),
            message: parts.join(": "),
        }
    }
}

fn io_error_code(err: &io::Error) -> Option<&'static str> {
    use io::ErrorKind::*;
    let code = match err.kind() {
        ConnectionRefused => "ECONNREFUSED",
        ConnectionReset => "ECONNRESET",
        ConnectionAborted => "ECONNABORTED",
        TimedOut => "ETIMEDOUT",
        BrokenPipe => "EPIPE",
        AddrNotAvailable => "EADDRNOTAVAIL",
        HostUnreachable => "EHOSTUNREACH",
        NetworkUnreachable => "ENETUNREACH",
        _ => return None,
    };
    Some(code)
}

/// Where a proxy error response would be written.
pub trait ErrorResponder {
    /// Whether the response head has already gone out on this connection.
    fn headers_sent(&self) -> bool;

    fn send_json(&mut self, status: StatusCode, body: &Value);
}

/// Log a transport failure and answer 502, unless the response has already
/// started.
pub fn handle_proxy_error(err: &ForwardError, url: &str, responder: &mut dyn ErrorResponder) {
    error!(
        "[proxy error] {} -> {}",
        err.code.as_deref().unwrap_or(&err.message),
        url
    );

    if responder.headers_sent() {
        return;
    }

    let mut body = json!({
        "error": "Bad Gateway",
        "message": err.message,
    });
    if let Some(code) = &err.code {
        body["code"] = Value::String(code.clone());
    }
    responder.send_json(StatusCode::BAD_GATEWAY, &body);
}

/// Responder for a response that has not started yet.
#[derive(Debug, Default)]
pub struct ResponseSlot {
    response: Option<Response<ProxyBody>>,
}

impl ResponseSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_response(self) -> Response<ProxyBody> {
        self.response
            .unwrap_or_else(|| JsonResponseBuilder::new(StatusCode::BAD_GATEWAY).build_boxed())
    }
}

impl ErrorResponder for ResponseSlot {
    fn headers_sent(&self) -> bool {
        self.response.is_some()
    }

    fn send_json(&mut self, status: StatusCode, body: &Value) {
        if self.response.is_none() {
            self.response = Some(JsonResponseBuilder::new(status).json(body).build_boxed());
        }
    }
}

/// Responder for a response whose head is already on the wire. Nothing more
/// can be written, so errors are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommittedResponse;

impl ErrorResponder for CommittedResponse {
    fn headers_sent(&self) -> bool {
        true
    }

    fn send_json(&mut self, _status: StatusCode, _body: &Value) {}
}
