use clap::Parser;
use local_proxy::config::init_template;
use local_proxy::{CliArgs, LocalProxyServer, ProxyConfig};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = CliArgs::parse();
    if let Err(e) = run(args).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    if args.init {
        let dir = match &args.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let path = init_template(&dir)?;
        info!("Created {}", path.display());
        info!("Edit it, then start the proxy with --target <url>");
        return Ok(());
    }

    let config = ProxyConfig::from_args(&args)?;
    let server = LocalProxyServer::bind(&config)?;

    info!("Forwarding {} to {}", config.api_prefix, config.target);
    info!(
        "Scenarios: {}",
        config.base_dir.join(&config.scenarios_path).display()
    );

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await
}
