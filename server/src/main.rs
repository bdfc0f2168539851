//! Vector stream server
//!
//! Streams fixed-length vectors of doubles to every connected client at a
//! target rate.

use anyhow::{Context, Result};
use clap::Parser;
use ratebench_server::{ProducerKind, ServerConfig, WaitStrategy};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ratebench-server")]
#[command(about = "Stream fixed-length vectors to TCP clients at a target rate", long_about = None)]
#[command(version)]
struct Args {
    /// Address to bind to (e.g. 127.0.0.1:8888)
    #[arg(short, long)]
    listen: Option<String>,

    /// Target send frequency in Hz
    #[arg(short, long)]
    freq: Option<f64>,

    /// Number of doubles per vector
    #[arg(short = 'n', long)]
    vector_len: Option<usize>,

    /// Wait strategy between sends: "busy-poll" or "sleep"
    #[arg(short, long)]
    wait: Option<WaitStrategy>,

    /// Vector producer: "random" or "test-pattern"
    #[arg(short, long)]
    producer: Option<ProducerKind>,

    /// Seed for the random producer
    #[arg(long)]
    seed: Option<u64>,

    /// Configuration file (TOML, JSON, YAML)
    #[arg(short, long, env = "RATEBENCH_SERVER_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.verbose);

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(freq) = args.freq {
        config.send_freq_hz = freq;
    }
    if let Some(vector_len) = args.vector_len {
        config.vector_len = vector_len;
    }
    if let Some(wait) = args.wait {
        config.wait_strategy = wait;
    }
    if let Some(producer) = args.producer {
        config.producer = producer;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    info!("Configuration: {:?}", config);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            signal.cancel();
        }
    });

    ratebench_server::run_server(config, shutdown)
        .await
        .context("Server failed")
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
