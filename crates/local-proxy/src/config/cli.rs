//! Command-line surface.
//!
//! Every option that has an environment variable can be given either way;
//! an explicit flag wins over the environment, which wins over the default.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "local-proxy",
    version,
    about = "Local development proxy with scenario-based mocking"
)]
pub struct CliArgs {
    /// Upstream API URL, e.g. https://api.example.com
    #[arg(short, long, env = "TARGET", required_unless_present = "init")]
    pub target: Option<String>,

    /// Port to listen on
    #[arg(
        short,
        long,
        env = "PORT",
        default_value_t = 5050,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: u16,

    /// API path prefix that is mocked or forwarded
    #[arg(short = 'a', long, env = "API_PREFIX", default_value = "/api")]
    pub api_prefix: String,

    /// Path to the scenarios file, relative to the base directory
    #[arg(short, long, default_value = "./scenarios.json")]
    pub scenarios: PathBuf,

    /// Directory scenario and fixture paths are resolved against
    /// (defaults to the current directory)
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Verify the upstream's TLS certificate
    #[arg(long)]
    pub verify_tls: bool,

    /// Create a scenarios.json template and exit
    #[arg(long)]
    pub init: bool,
}
