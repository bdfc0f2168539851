//! Vector stream client
//!
//! Consumes the vector stream, measures its rate and writes per-batch
//! statistics to a file.

use anyhow::{Context, Result};
use clap::Parser;
use ratebench_client::{ClientConfig, OutputFormat, RateWindowKind};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ratebench-client")]
#[command(about = "Measure a vector stream's rate and batch statistics", long_about = None)]
#[command(version)]
struct Args {
    /// Server address (e.g. 127.0.0.1:8888)
    #[arg(short = 'a', long)]
    connect: Option<String>,

    /// Output file (default: out_<time>.<ext>)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Output format: "csv" or "json-lines"
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Number of doubles per vector
    #[arg(short = 'n', long)]
    vector_len: Option<usize>,

    /// Vectors per summary row
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Rate window: "rolling" or "buffered"
    #[arg(short, long)]
    rate_window: Option<RateWindowKind>,

    /// Configuration file (TOML, JSON, YAML)
    #[arg(short, long, env = "RATEBENCH_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (per-batch rate summaries)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.verbose);

    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(connect) = args.connect {
        config.connect_addr = connect;
    }
    if args.out.is_some() {
        config.output_path = args.out;
    }
    if let Some(format) = args.format {
        config.output_format = format;
    }
    if let Some(vector_len) = args.vector_len {
        config.vector_len = vector_len;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(rate_window) = args.rate_window {
        config.rate_window = rate_window;
    }
    info!("Configuration: {:?}", config);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            signal.cancel();
        }
    });

    ratebench_client::run_client(config, shutdown)
        .await
        .context("Client failed")?;

    info!("done.");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
