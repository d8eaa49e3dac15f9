//! Proxy Fallback: forwarding unmocked requests to the upstream.

use super::client::HttpClient;
use super::error::ForwardError;
use super::ProxyBody;
use async_trait::async_trait;
use http_body_util::BodyExt;
use hyper::header::{HeaderValue, HOST};
use hyper::{Request, Response, Uri};
use tracing::debug;

/// Forwards a request to the real service and relays the response head.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(&self, req: Request<ProxyBody>) -> Result<Response<ProxyBody>, ForwardError>;
}

/// [`Upstream`] over the hyper client.
pub struct HttpUpstream {
    client: HttpClient,
    /// `scheme://authority` of the target.
    origin: String,
    /// Path of the target URL without a trailing `/` (empty for the root).
    base_path: String,
    host: HeaderValue,
    api_prefix: String,
}

impl HttpUpstream {
    pub fn new(
        client: HttpClient,
        target: &Uri,
        api_prefix: impl Into<String>,
    ) -> Result<Self, ForwardError> {
        let (Some(scheme), Some(authority)) = (target.scheme_str(), target.authority()) else {
            return Err(ForwardError::new(
                None,
                format!("Upstream target {target} is not an absolute URL"),
            ));
        };
        let host = HeaderValue::from_str(authority.as_str())
            .map_err(|e| ForwardError::new(None, format!("Invalid upstream host: {e}")))?;

        Ok(Self {
            client,
            origin: format!("{scheme}://{authority}"),
            base_path: target.path().trim_end_matches('/').to_string(),
            host,
            api_prefix: api_prefix.into(),
        })
    }

    /// Absolute upstream URI for an inbound path and query.
    pub fn upstream_uri(&self, path_and_query: &str) -> String {
        format!(
            "{}{}{}",
            self.origin,
            self.base_path,
            rewrite_path(path_and_query, &self.api_prefix)
        )
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(&self, req: Request<ProxyBody>) -> Result<Response<ProxyBody>, ForwardError> {
        let (mut parts, body) = req.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let full_uri = self.upstream_uri(path_and_query);
        debug!("Forwarding {} to {}", parts.method, full_uri);

        parts.uri = full_uri
            .parse()
            .map_err(|e| ForwardError::new(None, format!("Invalid upstream URI {full_uri}: {e}")))?;
        parts.headers.insert(HOST, self.host.clone());

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| ForwardError::from_error(&e))?;

        Ok(response.map(|body| body.boxed()))
    }
}

/// Path component of a request target, for origin-form (`/a?b`) and
/// absolute-form (`http://host/a?b`) alike.
pub fn request_pathname(uri: &Uri) -> &str {
    match uri.path() {
        "" => "/",
        path => path,
    }
}

/// The part of `path` below `prefix`, or `None` when `path` is outside it.
///
/// Matching is per segment: `/apiary` is not under `/api`. The prefix itself
/// maps to `/`.
pub fn strip_api_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Make sure the outbound path carries `prefix` exactly once.
///
/// A path already under the prefix is returned unchanged, anything else is
/// prefixed. The query string is kept as is.
pub fn rewrite_path(path_and_query: &str, prefix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    };

    let path = if prefix.is_empty() || strip_api_prefix(path, prefix).is_some() {
        path.to_string()
    } else if path.is_empty() || path == "/" {
        prefix.to_string()
    } else if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    };

    match query {
        Some(query) => format!("{path}?{query}"),
        None => path,
    }
}
