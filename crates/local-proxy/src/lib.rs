//! local-proxy: a development proxy that answers selected API endpoints from
//! a scenarios file and forwards everything else to the real upstream.
//!
//! Each request under the API prefix goes through the [`MockDispatcher`]:
//! the scenarios file is loaded through the [`ScenarioStore`], the first
//! matching enabled rule is found by [`match_rule`], and its active scenario
//! is rendered. When nothing matches, the request is forwarded unchanged
//! through an [`Upstream`](proxy::Upstream).

pub mod config;
pub mod dispatcher;
pub mod matcher;
pub mod proxy;
pub mod render;
pub mod response;
pub mod store;

pub use config::{CliArgs, ConfigError, ProxyConfig};
pub use dispatcher::{Dispatch, MockDispatcher};
pub use matcher::{match_rule, MatchResult};
pub use proxy::{LocalProxy, LocalProxyServer};
pub use render::{render, Rendered};
pub use store::{FileAccess, LocalFs, ScenarioStore, StoreError};
