//! Squid mem-pool exporter
//!
//! Scrapes the Squid cache manager `mem` report and republishes the per-worker
//! pool sizes as Prometheus gauges. Output goes to stdout; there is no HTTP
//! server.
//!
//! # Usage
//! ```sh
//! SQUID_HOSTNAME=proxy.local squid-mempool-exporter run
//! squid-mempool-exporter once --port 3129
//! squid-mempool-exporter parse --file mem.txt
//! ```
//!
//! # Environment Variables
//! - `SQUID_HOSTNAME` / `SQUID_PORT` - cache manager address (default: localhost:3128)
//! - `SQUID_SCRAPE_TIMEOUT_SECS` - total request timeout (default: 10)
//! - `SQUID_CONNECT_TIMEOUT_SECS` - connect timeout (default: 5)
//! - `EXPORTER_INTERVAL_SECS` - seconds between cycles in `run` (default: 15)
//! - `EXPORTER_OUTPUT` - `text` or `json` (default: text)

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use squid_mempool_exporter::application::Application;
use squid_mempool_exporter::config::{Config, OutputFormat};
use squid_mempool_exporter::infrastructure::mock::StaticReportSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Squid mem-pool Prometheus exporter", long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Command-line values take precedence over the environment
#[derive(Args)]
struct Overrides {
    /// Squid hostname
    #[arg(long, global = true)]
    host: Option<String>,

    /// Squid cache manager port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Total request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Seconds between cycles
    #[arg(long, global = true)]
    interval_secs: Option<u64>,

    /// Output format (text, json)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape periodically until interrupted
    Run,
    /// Run a single cycle and print the result
    Once,
    /// Parse a captured mem report instead of fetching one
    Parse {
        /// Path to the saved report
        #[arg(short, long)]
        file: String,
    },
}

impl Overrides {
    fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(host) = self.host {
            config.scrape.hostname = host;
        }
        if let Some(port) = self.port {
            config.scrape.port = port;
        }
        if let Some(secs) = self.timeout_secs {
            config.scrape.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.interval_secs {
            if secs == 0 {
                bail!("--interval-secs must be greater than 0");
            }
            config.observability.interval_seconds = secs;
        }
        if let Some(output) = self.output {
            config.observability.output = output;
        }
        Ok(())
    }
}

/// `RUST_LOG` directives when set and valid, `info` otherwise
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only metrics
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    cli.overrides.apply(&mut config)?;

    info!(
        "Squid mem-pool exporter {} starting (target {}:{})",
        env!("CARGO_PKG_VERSION"),
        config.scrape.hostname,
        config.scrape.port
    );

    match cli.command {
        Commands::Run => {
            let app = Application::build(config)?;
            let reporter = app.reporter();

            tokio::select! {
                _ = reporter.run() => {}
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Shutdown signal received. Exiting...");
                }
            }
        }
        Commands::Once => {
            let app = Application::build(config)?;
            let output = app.reporter().cycle().await?;
            println!("{}", output.rendered.trim_end());
            if !output.fetched {
                bail!("Failed to fetch the mem report");
            }
        }
        Commands::Parse { file } => {
            let source = StaticReportSource::from_file(&file).await?;
            let app = Application::with_source(config, Arc::new(source))?;
            let output = app.reporter().cycle().await?;
            if app.metrics.mempool.is_empty() {
                warn!("No kid rows found in {}", file);
            }
            println!("{}", output.rendered.trim_end());
        }
    }

    Ok(())
}
