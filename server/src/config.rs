//! Configuration types for the vector server

use crate::pacing::WaitStrategy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix, e.g. `RATEBENCH_SERVER_SEND_FREQ_HZ=500`.
pub const ENV_PREFIX: &str = "RATEBENCH_SERVER";

/// Upper bound on the send frequency.
pub const MAX_SEND_FREQ_HZ: f64 = 10_000.0;

/// Lower bound on the send frequency (one vector every 1000 s).
pub const MIN_SEND_FREQ_HZ: f64 = 0.001;

/// Which vectors the server streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProducerKind {
    /// Independent standard-normal components
    #[default]
    Random,
    /// All-equal components stepping up by one every 100 vectors
    TestPattern,
}

impl std::str::FromStr for ProducerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(ProducerKind::Random),
            "test-pattern" | "test_pattern" | "pattern" => Ok(ProducerKind::TestPattern),
            _ => anyhow::bail!("Invalid producer: {}", s),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub listen_addr: String,

    /// Target send frequency per connection, in Hz
    pub send_freq_hz: f64,

    /// Number of doubles per vector (must match the client)
    pub vector_len: usize,

    /// How the sender waits out the rest of each interval
    pub wait_strategy: WaitStrategy,

    /// Vector source for each connection
    pub producer: ProducerKind,

    /// Seed for the random producer (None = seeded from entropy)
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8888".to_string(),
            send_freq_hz: 1000.0,
            vector_len: 50,
            wait_strategy: WaitStrategy::BusyPoll,
            producer: ProducerKind::Random,
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional file, then `RATEBENCH_SERVER_*`
    /// environment variables. Missing keys keep their defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        builder
            .build()
            .context("Failed to read server configuration")?
            .try_deserialize()
            .context("Failed to parse server configuration")
    }

    /// Target interval between the starts of two consecutive sends.
    ///
    /// Frequencies below [`MIN_SEND_FREQ_HZ`] are clamped to it.
    pub fn send_interval(&self) -> Duration {
        if self.send_freq_hz <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(1.0 / self.send_freq_hz.max(MIN_SEND_FREQ_HZ))
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.send_freq_hz.is_nan() || self.send_freq_hz <= 0.0 {
            anyhow::bail!("Send frequency must be greater than 0");
        }

        if self.send_freq_hz < MIN_SEND_FREQ_HZ {
            anyhow::bail!("Send frequency too low (min {} Hz)", MIN_SEND_FREQ_HZ);
        }

        if self.send_freq_hz > MAX_SEND_FREQ_HZ {
            anyhow::bail!("Send frequency too high (max {} Hz)", MAX_SEND_FREQ_HZ);
        }

        if self.vector_len == 0 {
            anyhow::bail!("Vector length must be greater than 0");
        }

        Ok(())
    }
}
