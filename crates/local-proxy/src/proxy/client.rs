//! Upstream HTTP client.

use super::tls::NoVerifier;
use super::ProxyBody;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use tracing::warn;

pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, ProxyBody>;

/// Create the client used to reach the upstream.
///
/// Idle connections are never pooled, so every forwarded request opens a
/// fresh connection. With `verify_tls` off any certificate is accepted.
pub fn create_http_client(verify_tls: bool) -> anyhow::Result<HttpClient> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut http_connector = HttpConnector::new();
    http_connector.enforce_http(false);

    let https_connector = if verify_tls {
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_native_roots(provider)?
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector)
    } else {
        warn!("Upstream TLS certificate verification is disabled (use --verify-tls to enable)");
        let tls_config = rustls::ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier::new(provider)))
            .with_no_client_auth();
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector)
    };

    Ok(Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(0)
        .build(https_connector))
}
