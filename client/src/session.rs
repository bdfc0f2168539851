//! Receive loop for one connection
//!
//! Reads frames until the stream ends, the peer drops, or shutdown fires,
//! feeding each vector to the batch pipeline and every completed row to the
//! sink. A partial batch at the end of a session is dropped.

use crate::output::RowSink;
use crate::pipeline::BatchPipeline;
use anyhow::{Context, Result};
use ratebench_shared::protocol::frame::FrameCodec;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Orderly end of stream at a frame boundary
    StreamClosed,
    /// The peer reset or aborted the connection
    PeerReset,
    /// Shutdown was requested
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSummary {
    pub frames: u64,
    pub rows: u64,
    /// Vectors of the unfinished batch that were discarded
    pub dropped: usize,
    pub end: SessionEnd,
}

/// Run the receive-and-aggregate loop over `reader`.
///
/// Framing errors and contract violations end the session with an error;
/// nothing is retried.
pub async fn run_session<R>(
    reader: &mut R,
    codec: &mut FrameCodec,
    pipeline: &mut BatchPipeline,
    sink: &mut dyn RowSink,
    shutdown: &CancellationToken,
) -> Result<SessionSummary>
where
    R: AsyncRead + Unpin,
{
    let mut frames = 0u64;
    let mut rows = 0u64;

    let end = loop {
        let frame = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("cancelled");
                break SessionEnd::Cancelled;
            }
            frame = codec.read_frame(reader) => frame,
        };

        let vector = match frame {
            Ok(Some(vector)) => vector,
            Ok(None) => break SessionEnd::StreamClosed,
            Err(e) if e.is_disconnect() => {
                warn!("Connection lost: {}", e);
                break SessionEnd::PeerReset;
            }
            Err(e) => return Err(e).context("Failed to read frame"),
        };
        frames += 1;

        if let Some(row) = pipeline
            .push(&vector)
            .context("Received vector does not match configuration")?
        {
            sink.write_row(&row)?;
            rows += 1;
        }
    };

    Ok(SessionSummary {
        frames,
        rows,
        dropped: pipeline.pending(),
        end,
    })
}
