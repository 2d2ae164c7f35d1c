use anyhow::{Context, Result};
use clap::Parser;
use envoy2records_server::ServerConfig;
use std::path::PathBuf;

/// Receiver normalizing envoy metrics streams for a downstream aggregation
/// pipeline
#[derive(Parser)]
#[command(name = "envoy2records")]
#[command(version)]
#[command(about = "Envoy metrics stream receiver", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address (overrides config file)
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Config file, then environment, then CLI flags - highest priority last.
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServerConfig::load_or_default().context("Failed to load configuration")?,
    };
    config.apply_env_overrides();

    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    envoy2records_server::run(config).await
}
