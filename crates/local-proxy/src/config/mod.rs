//! Process configuration for local-proxy.

mod cli;
mod template;

use hyper::Uri;
use std::path::PathBuf;

pub use cli::CliArgs;
pub use template::{init_template, SCENARIOS_TEMPLATE, TEMPLATE_FILE_NAME};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: target is required (use --target or TARGET)")]
    MissingTarget,

    #[error("Invalid configuration: target must be a valid http(s) URL, got '{0}'")]
    InvalidTarget(String),

    #[error("Invalid configuration: apiPrefix must start with /, got '{0}'")]
    InvalidPrefix(String),

    #[error("Invalid configuration: port must be between 1 and 65535")]
    InvalidPort,

    #[error("Cannot determine the working directory: {0}")]
    WorkingDir(#[source] std::io::Error),

    #[error("{} already exists", .0.display())]
    TemplateExists(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    TemplateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Validated settings the server is built from.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    /// Upstream origin; its path, if any, is prepended to forwarded paths.
    pub target: Uri,
    /// Mount prefix, always starting with `/` and without a trailing `/`
    /// (except for the root prefix itself).
    pub api_prefix: String,
    pub scenarios_path: PathBuf,
    pub base_dir: PathBuf,
    pub verify_tls: bool,
}

impl ProxyConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let target = args.target.as_deref().ok_or(ConfigError::MissingTarget)?;
        let base_dir = match &args.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(ConfigError::WorkingDir)?,
        };

        let config = Self {
            port: args.port,
            target: parse_target(target)?,
            api_prefix: normalize_prefix(&args.api_prefix)?,
            scenarios_path: args.scenarios.clone(),
            base_dir,
            verify_tls: args.verify_tls,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidPrefix(self.api_prefix.clone()));
        }
        if !is_http_origin(&self.target) {
            return Err(ConfigError::InvalidTarget(self.target.to_string()));
        }
        Ok(())
    }
}

fn parse_target(raw: &str) -> Result<Uri, ConfigError> {
    let uri: Uri = raw
        .parse()
        .map_err(|_| ConfigError::InvalidTarget(raw.to_string()))?;
    if !is_http_origin(&uri) {
        return Err(ConfigError::InvalidTarget(raw.to_string()));
    }
    Ok(uri)
}

fn is_http_origin(uri: &Uri) -> bool {
    matches!(uri.scheme_str(), Some("http") | Some("https"))
        && uri.host().is_some_and(|h| !h.is_empty())
}

fn normalize_prefix(raw: &str) -> Result<String, ConfigError> {
    if !raw.starts_with('/') {
        return Err(ConfigError::InvalidPrefix(raw.to_string()));
    }
    let trimmed = raw.trim_end_matches('/');
    Ok(if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    })
}
