//! Packet arrival rate tracking
//!
//! Every arrival after the first yields one frequency sample, `1 / diff`,
//! where `diff` is the time since the previous arrival. Samples are folded
//! into a [`RateWindow`]; resetting the window never forgets the previous
//! arrival time, so timing carries over seamlessly between reporting windows.

use ratebench_shared::stats::{mean_std, RunningStat};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Aggregation over the frequency samples of one reporting window
pub trait RateWindow: Send {
    fn add(&mut self, freq_hz: f64);

    /// Number of samples in the window
    fn size(&self) -> usize;

    fn reset(&mut self);

    /// `(mean, standard deviation)` of the samples, `(0, 0)` when empty
    fn stats(&self) -> (f64, f64);
}

/// O(1) memory window built on [`RunningStat`]
#[derive(Debug, Default)]
pub struct RollingWindow {
    stat: RunningStat,
}

impl RateWindow for RollingWindow {
    fn add(&mut self, freq_hz: f64) {
        self.stat.push(freq_hz);
    }

    fn size(&self) -> usize {
        self.stat.count() as usize
    }

    fn reset(&mut self) {
        self.stat.reset();
    }

    fn stats(&self) -> (f64, f64) {
        self.stat.stats()
    }
}

/// Keeps every sample and computes the statistics in two passes
#[derive(Debug, Default)]
pub struct BufferedWindow {
    samples: Vec<f64>,
}

impl BufferedWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

impl RateWindow for BufferedWindow {
    fn add(&mut self, freq_hz: f64) {
        self.samples.push(freq_hz);
    }

    fn size(&self) -> usize {
        self.samples.len()
    }

    fn reset(&mut self) {
        self.samples.clear();
    }

    fn stats(&self) -> (f64, f64) {
        mean_std(&self.samples)
    }
}

/// Which [`RateWindow`] the tracker uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateWindowKind {
    #[default]
    Rolling,
    Buffered,
}

impl std::str::FromStr for RateWindowKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rolling" => Ok(RateWindowKind::Rolling),
            "buffered" => Ok(RateWindowKind::Buffered),
            _ => anyhow::bail!("Invalid rate window: {}", s),
        }
    }
}

/// Measures the inter-arrival frequency of packets
pub struct RateTracker {
    last_time: Option<Instant>,
    window: Box<dyn RateWindow>,
}

impl RateTracker {
    /// Create a tracker; `capacity_hint` sizes a buffered window.
    pub fn new(kind: RateWindowKind, capacity_hint: usize) -> Self {
        let window: Box<dyn RateWindow> = match kind {
            RateWindowKind::Rolling => Box::<RollingWindow>::default(),
            RateWindowKind::Buffered => Box::new(BufferedWindow::with_capacity(capacity_hint)),
        };
        Self::with_window(window)
    }

    pub fn with_window(window: Box<dyn RateWindow>) -> Self {
        Self {
            last_time: None,
            window,
        }
    }

    /// Record an arrival now.
    pub fn got_packet(&mut self) -> Option<f64> {
        self.got_packet_at(Instant::now())
    }

    /// Record an arrival at `now`. Returns the frequency sample it produced:
    /// none for the first arrival ever, none when no time has passed.
    pub fn got_packet_at(&mut self, now: Instant) -> Option<f64> {
        let last = self.last_time.replace(now)?;
        let diff = now.saturating_duration_since(last).as_secs_f64();
        if diff == 0.0 {
            return None;
        }
        let freq_hz = 1.0 / diff;
        self.window.add(freq_hz);
        Some(freq_hz)
    }

    pub fn size(&self) -> usize {
        self.window.size()
    }

    pub fn stats(&self) -> (f64, f64) {
        self.window.stats()
    }

    /// Clear the window. The last arrival time is kept.
    pub fn reset(&mut self) {
        self.window.reset();
    }
}
