use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::http::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Response, StatusCode};
use serde_json::Value;
use std::convert::Infallible;
use std::str::FromStr;

pub const APPLICATION_JSON: &str = "application/json";

/// Builds JSON responses without any fallible `http::Builder` calls.
pub struct JsonResponseBuilder {
    status: StatusCode,
    body: Bytes,
    headers: HeaderMap,
}

impl JsonResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        JsonResponseBuilder {
            status,
            body: Bytes::new(),
            headers,
        }
    }

    /// Serialize a JSON value as the body.
    pub fn json(mut self, value: &Value) -> Self {
        self.body = Bytes::from(value.to_string());
        self
    }

    /// Use pre-serialized bytes (e.g. fixture contents) verbatim.
    pub fn raw(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header, silently skipping invalid names or values.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_str(name), HeaderValue::from_str(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn build_full(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    pub fn build_boxed(self) -> Response<BoxBody<Bytes, hyper::Error>> {
        self.build_full()
            .map(|body| body.map_err(|never: Infallible| match never {}).boxed())
    }
}
