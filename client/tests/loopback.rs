//! End-to-end: a real server streaming the test pattern over loopback TCP.

use anyhow::Result;
use ratebench_client::accumulator::WindowedAccumulator;
use ratebench_client::output::RowSink;
use ratebench_client::pipeline::BatchPipeline;
use ratebench_client::rate::{RateTracker, RateWindowKind};
use ratebench_client::session::{run_session, SessionEnd};
use ratebench_client::{ClientConfig, OutputFormat};
use ratebench_server::{ProducerKind, ServerConfig, WaitStrategy};
use ratebench_shared::protocol::frame::FrameCodec;
use ratebench_shared::SummaryRow;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

const VECTOR_LEN: usize = 4;

/// Collects rows and cancels the session once `limit` rows arrived.
struct StopAfter {
    rows: Vec<SummaryRow>,
    limit: usize,
    shutdown: CancellationToken,
}

impl RowSink for StopAfter {
    fn write_row(&mut self, row: &SummaryRow) -> Result<()> {
        self.rows.push(row.clone());
        if self.rows.len() >= self.limit {
            self.shutdown.cancel();
        }
        Ok(())
    }
}

async fn start_server(freq_hz: f64, shutdown: CancellationToken) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let config = ServerConfig {
        listen_addr: addr.to_string(),
        send_freq_hz: freq_hz,
        vector_len: VECTOR_LEN,
        wait_strategy: WaitStrategy::BusyPoll,
        producer: ProducerKind::TestPattern,
        seed: None,
    };
    tokio::spawn(ratebench_server::serve(listener, config, shutdown));
    Ok(addr)
}

async fn collect_rows(addr: SocketAddr, rows: usize) -> Result<Vec<SummaryRow>> {
    let mut stream = TcpStream::connect(addr).await?;
    let mut pipeline = BatchPipeline::new(
        RateTracker::new(RateWindowKind::Rolling, 100),
        WindowedAccumulator::new(VECTOR_LEN, 100),
        100,
    );
    let shutdown = CancellationToken::new();
    let mut sink = StopAfter {
        rows: Vec::new(),
        limit: rows,
        shutdown: shutdown.clone(),
    };

    let summary = run_session(
        &mut stream,
        &mut FrameCodec::new(),
        &mut pipeline,
        &mut sink,
        &shutdown,
    )
    .await?;
    assert_eq!(summary.end, SessionEnd::Cancelled);
    assert_eq!(summary.rows as usize, rows);
    Ok(sink.rows)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pattern_batches_end_to_end() -> Result<()> {
    let server_shutdown = CancellationToken::new();
    let addr = start_server(1000.0, server_shutdown.clone()).await?;

    let rows = collect_rows(addr, 2).await?;
    assert_eq!(rows[0].vector_mean, vec![0.0; VECTOR_LEN]);
    assert_eq!(rows[0].vector_std, vec![0.0; VECTOR_LEN]);
    assert_eq!(rows[1].vector_mean, vec![1.0; VECTOR_LEN]);
    assert_eq!(rows[1].vector_std, vec![0.0; VECTOR_LEN]);
    for row in &rows {
        assert!(row.rate_mean.is_finite() && row.rate_mean > 0.0);
        assert!(row.rate_std.is_finite() && row.rate_std >= 0.0);
        assert_eq!(row.width(), 2 + 2 * VECTOR_LEN);
    }

    server_shutdown.cancel();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_clients_are_independent() -> Result<()> {
    let server_shutdown = CancellationToken::new();
    let addr = start_server(1000.0, server_shutdown.clone()).await?;

    let (a, b) = tokio::join!(collect_rows(addr, 2), collect_rows(addr, 2));
    for rows in [a?, b?] {
        // Each connection has its own producer, so both start from zero.
        assert_eq!(rows[0].vector_mean, vec![0.0; VECTOR_LEN]);
        assert_eq!(rows[1].vector_mean, vec![1.0; VECTOR_LEN]);
    }

    server_shutdown.cancel();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_client_writes_csv_until_server_closes() -> Result<()> {
    let server_shutdown = CancellationToken::new();
    let addr = start_server(2000.0, server_shutdown.clone()).await?;

    let dir = tempfile::tempdir()?;
    let output_path = dir.path().join("out.csv");
    let config = ClientConfig {
        connect_addr: addr.to_string(),
        vector_len: VECTOR_LEN,
        batch_size: 20,
        output_path: Some(output_path.clone()),
        output_format: OutputFormat::Csv,
        ..ClientConfig::default()
    };
    let client = tokio::spawn(ratebench_client::run_client(config, CancellationToken::new()));

    tokio::time::sleep(Duration::from_millis(300)).await;
    server_shutdown.cancel();

    let summary = client.await??;
    assert_eq!(summary.end, SessionEnd::StreamClosed);
    assert!(summary.rows >= 2, "only {} rows", summary.rows);
    assert!(summary.dropped < 20);

    let text = std::fs::read_to_string(&output_path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len() as u64, summary.rows);
    for line in &lines {
        assert_eq!(line.split(',').count(), 2 + 2 * VECTOR_LEN);
    }
    // The first 20 vectors of the pattern are all zero.
    let first: Vec<f64> = lines[0].split(',').map(|v| v.parse().unwrap()).collect();
    assert_eq!(&first[2..], &[0.0; 2 * VECTOR_LEN]);
    Ok(())
}
