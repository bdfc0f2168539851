//! Vector stream server library
//!
//! Accepts any number of TCP clients and streams fixed-length vectors to each
//! one at a target rate. Every connection owns its producer, codec and send
//! loop; nothing is shared between connections.

pub mod config;
pub mod pacing;
pub mod producer;
pub mod sender;

pub use config::{ProducerKind, ServerConfig};
pub use pacing::WaitStrategy;

use anyhow::{Context, Result};
use producer::{build_producer, VectorProducer};
use sender::PacedSender;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, info_span, warn, Instrument};

/// Pause after a failed accept before trying again.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// How long shutdown waits for connections to finish their current frame.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Bind the configured address and serve until `shutdown` fires.
pub async fn run_server(config: ServerConfig, shutdown: CancellationToken) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    serve(listener, config, shutdown).await
}

/// Accept clients on an already bound listener until `shutdown` fires.
///
/// Cancelling `shutdown` also cancels every connection's send loop. The call
/// returns once every connection has finished its in-flight frame and closed
/// its stream, or after [`SHUTDOWN_GRACE`] if some peer stops reading.
pub async fn serve(listener: TcpListener, config: ServerConfig, shutdown: CancellationToken) -> Result<()> {
    let local_addr = listener.local_addr().context("Listener has no local address")?;
    info!(
        "Serving on {} ({} Hz, {} values per vector, {:?} wait)",
        local_addr, config.send_freq_hz, config.vector_len, config.wait_strategy
    );

    let connections = TaskTracker::new();
    let mut connection_id = 0u64;
    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        let (stream, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Accept failed: {}", e);
                if !backoff(&shutdown).await {
                    break;
                }
                continue;
            }
        };

        // Each connection gets its own generator; offsetting an explicit seed
        // keeps runs reproducible without clients sharing a stream.
        let seed = config.seed.map(|s| s.wrapping_add(connection_id));
        let producer = build_producer(config.producer, config.vector_len, seed);
        let sender = PacedSender::new(producer, config.send_interval(), config.wait_strategy);

        let span = info_span!("connection", id = connection_id, peer = %peer);
        connections.spawn(handle_client(stream, peer, sender, shutdown.child_token()).instrument(span));
        connection_id += 1;
    }

    connections.close();
    if !connections.is_empty() {
        info!("Waiting for {} connection(s) to close", connections.len());
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, connections.wait()).await.is_err() {
        warn!(
            "{} connection(s) still open after {:?}, abandoning them",
            connections.len(),
            SHUTDOWN_GRACE
        );
    }

    info!("Listener on {} shut down", local_addr);
    Ok(())
}

/// Sleep for [`ACCEPT_BACKOFF`]. Returns `false` if shutdown fired first.
async fn backoff(shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(ACCEPT_BACKOFF) => true,
    }
}

async fn handle_client<P: VectorProducer>(
    mut stream: TcpStream,
    peer: SocketAddr,
    mut sender: PacedSender<P>,
    shutdown: CancellationToken,
) {
    info!("Received connection from {}", peer);
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }

    match sender.run(&mut stream, &shutdown).await {
        Ok(summary) => info!(
            "Connection closed ({:?}) after {} vectors at {:.2} Hz",
            summary.reason,
            summary.sent,
            summary.achieved_rate_hz()
        ),
        Err(e) => warn!("Send loop failed: {}", e),
    }

    if let Err(e) = stream.shutdown().await {
        debug!("Shutdown of {} failed: {}", peer, e);
    }
}
