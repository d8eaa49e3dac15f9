//! Serving layer: request routing, upstream forwarding and the accept loop.
//!
//! - `handler` - prefix routing, mock dispatch and fallback
//! - `forwarding` - the [`Upstream`] collaborator and path rewriting
//! - `error` - transport failures and the 502 responder
//! - `server` - listener and connection loop
//! - `client` / `tls` / `network` - hyper client, TLS and socket setup

mod client;
mod error;
mod forwarding;
mod handler;
pub mod headers;
mod network;
mod server;
mod tls;


use bytes::Bytes;
use http_body_util::combinators::BoxBody;

/// Body type of every response the proxy produces.
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

pub use client::{create_http_client, HttpClient};
pub use error::{handle_proxy_error, CommittedResponse, ErrorResponder, ForwardError, ResponseSlot};
pub use forwarding::{request_pathname, rewrite_path, strip_api_prefix, HttpUpstream, Upstream};
pub use handler::LocalProxy;
pub use network::create_listener;
pub use server::LocalProxyServer;
