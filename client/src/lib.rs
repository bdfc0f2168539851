//! Vector stream client library
//!
//! Connects to a vector server, measures the packet arrival rate, accumulates
//! windowed statistics over the received vectors and writes one summary row
//! per batch.

pub mod accumulator;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod rate;
pub mod session;

pub use config::ClientConfig;
pub use output::OutputFormat;
pub use rate::RateWindowKind;

use anyhow::{Context, Result};
use output::{default_output_path, open_sink};
use pipeline::BatchPipeline;
use ratebench_shared::protocol::frame::FrameCodec;
use session::{run_session, SessionSummary};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

/// Connect, consume the stream until it ends or `shutdown` fires, and write
/// summary rows to the configured output.
pub async fn run_client(config: ClientConfig, shutdown: CancellationToken) -> Result<SessionSummary> {
    config.validate().context("Invalid configuration")?;

    info!("Connecting to {}", config.connect_addr);
    let mut stream = TcpStream::connect(&config.connect_addr)
        .await
        .with_context(|| format!("Failed to connect to {}", config.connect_addr))?;
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }
    let local_addr = stream.local_addr().context("Socket has no local address")?;
    info!("My address: {}", local_addr);

    let output_path = config
        .output_path
        .clone()
        .unwrap_or_else(|| default_output_path(config.output_format));
    info!("Opening output: {}", output_path.display());
    let mut sink = open_sink(config.output_format, &output_path)?;

    let mut codec = FrameCodec::with_max_payload(config.max_payload_bytes);
    let mut pipeline = BatchPipeline::from_config(&config);

    let span = info_span!("session", local = %local_addr);
    let result = run_session(&mut stream, &mut codec, &mut pipeline, sink.as_mut(), &shutdown)
        .instrument(span)
        .await;

    info!("Closing the connection {}", local_addr);
    if let Err(e) = stream.shutdown().await {
        debug!("Shutdown of {} failed: {}", local_addr, e);
    }
    sink.flush()?;

    let summary = result?;
    info!(
        "Session ended ({:?}): {} frames, {} rows, {} vectors of a partial batch dropped",
        summary.end, summary.frames, summary.rows, summary.dropped
    );
    Ok(summary)
}
