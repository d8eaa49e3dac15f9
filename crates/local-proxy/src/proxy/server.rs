//! Listener and connection loop.

use super::handler::LocalProxy;
use super::network::create_listener;
use crate::config::ProxyConfig;
use anyhow::Context;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

pub struct LocalProxyServer {
    proxy: Arc<LocalProxy>,
    listener: TcpListener,
}

impl LocalProxyServer {
    /// Build the proxy from `config` and bind `0.0.0.0:<port>`.
    pub fn bind(config: &ProxyConfig) -> anyhow::Result<Self> {
        let proxy = LocalProxy::from_config(config)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener =
            create_listener(addr).with_context(|| format!("Failed to listen on {addr}"))?;
        Ok(Self::serve(listener, proxy))
    }

    /// Serve `proxy` on an already bound listener.
    pub fn serve(listener: TcpListener, proxy: LocalProxy) -> Self {
        Self {
            proxy: Arc::new(proxy),
            listener,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves. Connections already
    /// accepted keep running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!("Listening on http://{addr}{}", self.proxy.api_prefix());

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            let proxy = Arc::clone(&self.proxy);
                            tokio::spawn(serve_connection(stream, remote_addr, proxy));
                        }
                        Err(err) => error!("Failed to accept connection: {err}"),
                    }
                }
            }
        }
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    remote_addr: SocketAddr,
    proxy: Arc<LocalProxy>,
) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let proxy = Arc::clone(&proxy);
        async move { Ok::<_, Infallible>(proxy.handle(req.map(|body| body.boxed())).await) }
    });

    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
        if err.is_incomplete_message() || err.is_canceled() {
            debug!("Connection from {remote_addr} closed early: {err}");
        } else {
            error!("Error serving connection from {remote_addr}: {err}");
        }
    }
}
