//! Paced sender
//!
//! Drives a producer and the frame codec in a loop, holding each iteration to
//! the target interval measured from the start of that iteration.

use crate::pacing::WaitStrategy;
use crate::producer::VectorProducer;
use ratebench_shared::protocol::frame::{is_disconnect, FrameCodec};
use std::io;
use std::time::{Duration, Instant};
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Why a send loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The peer closed or reset the connection
    PeerDisconnected,
    /// Shutdown was requested
    Cancelled,
}

/// Outcome of one connection's send loop
#[derive(Debug, Clone, Copy)]
pub struct SendSummary {
    pub sent: u64,
    pub elapsed: Duration,
    pub reason: StopReason,
}

impl SendSummary {
    /// Achieved send rate over the whole loop, in Hz
    pub fn achieved_rate_hz(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.sent as f64 / secs
        } else {
            0.0
        }
    }
}

pub struct PacedSender<P> {
    producer: P,
    codec: FrameCodec,
    interval: Duration,
    strategy: WaitStrategy,
}

impl<P: VectorProducer> PacedSender<P> {
    pub fn new(producer: P, interval: Duration, strategy: WaitStrategy) -> Self {
        Self {
            producer,
            codec: FrameCodec::new(),
            interval,
            strategy,
        }
    }

    /// Send vectors until the peer disconnects or `shutdown` fires.
    ///
    /// A peer disconnect is a normal end of the loop. Any other write error is
    /// returned to the caller. Shutdown is observed between frames.
    pub async fn run<W>(&mut self, writer: &mut W, shutdown: &CancellationToken) -> io::Result<SendSummary>
    where
        W: AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let mut sent = 0u64;

        let reason = loop {
            if shutdown.is_cancelled() {
                break StopReason::Cancelled;
            }
            let start = Instant::now();
            let vector = self.producer.next_vector();

            // Not raced against shutdown: a frame is either fully written or not at all.
            match self.codec.write_frame(writer, vector).await {
                Ok(()) => sent += 1,
                Err(e) if is_disconnect(&e) => {
                    info!("Client disconnected: {}", e);
                    break StopReason::PeerDisconnected;
                }
                Err(e) => return Err(e),
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break StopReason::Cancelled,
                _ = self.strategy.wait_until(start + self.interval) => {}
            }
        };

        let summary = SendSummary {
            sent,
            elapsed: started.elapsed(),
            reason,
        };
        debug!(
            "Send loop ended after {} vectors ({:.2} Hz)",
            summary.sent,
            summary.achieved_rate_hz()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::TestPatternProducer;

    fn sender(interval: Duration) -> PacedSender<TestPatternProducer> {
        PacedSender::new(TestPatternProducer::new(3), interval, WaitStrategy::BusyPoll)
    }

    #[tokio::test]
    async fn test_peer_disconnect_ends_loop_normally() {
        let (mut server, mut client) = tokio::io::duplex(64 * 1024);
        let shutdown = CancellationToken::new();
        let mut sender = sender(Duration::from_millis(1));

        let task = tokio::spawn(async move { sender.run(&mut server, &shutdown).await });

        let mut codec = FrameCodec::new();
        for _ in 0..5 {
            let vector = codec.read_frame(&mut client).await.unwrap().unwrap();
            assert_eq!(vector, vec![0.0; 3]);
        }
        drop(client);

        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.reason, StopReason::PeerDisconnected);
        assert!(summary.sent >= 5);
    }

    #[tokio::test]
    async fn test_cancellation_stops_loop() {
        let (mut server, _client) = tokio::io::duplex(64 * 1024);
        let shutdown = CancellationToken::new();
        let mut sender = sender(Duration::from_millis(50));

        let token = shutdown.clone();
        let task = tokio::spawn(async move { sender.run(&mut server, &token).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.reason, StopReason::Cancelled);
        assert_eq!(summary.sent, 1);
    }

    #[tokio::test]
    async fn test_sends_are_paced() {
        let (mut server, mut client) = tokio::io::duplex(1024 * 1024);
        let shutdown = CancellationToken::new();
        let mut sender = sender(Duration::from_millis(5));

        let token = shutdown.clone();
        let task = tokio::spawn(async move { sender.run(&mut server, &token).await });

        let mut codec = FrameCodec::new();
        codec.read_frame(&mut client).await.unwrap().unwrap();
        let first = Instant::now();
        for _ in 0..20 {
            codec.read_frame(&mut client).await.unwrap().unwrap();
        }
        assert!(first.elapsed() >= Duration::from_millis(90));

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }
}
