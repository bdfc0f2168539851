//! Client configuration

use crate::output::OutputFormat;
use crate::rate::RateWindowKind;
use anyhow::Context;
use ratebench_shared::protocol::frame::{DEFAULT_MAX_PAYLOAD_SIZE, VALUE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `RATEBENCH_CLIENT_BATCH_SIZE=200`.
pub const ENV_PREFIX: &str = "RATEBENCH_CLIENT";

/// Vectors per summary row unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server address to connect to
    pub connect_addr: String,

    /// Number of doubles per vector (must match the server)
    pub vector_len: usize,

    /// Vectors per summary row
    pub batch_size: usize,

    /// Rate tracker window
    pub rate_window: RateWindowKind,

    /// Output file (None = `out_<unix seconds>.<ext>`)
    pub output_path: Option<PathBuf>,

    /// Output file format
    pub output_format: OutputFormat,

    /// Largest frame payload accepted from the server, in bytes
    pub max_payload_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_addr: "127.0.0.1:8888".to_string(),
            vector_len: 50,
            batch_size: DEFAULT_BATCH_SIZE,
            rate_window: RateWindowKind::Rolling,
            output_path: None,
            output_format: OutputFormat::Csv,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

impl ClientConfig {
    /// Load configuration from an optional file, then `RATEBENCH_CLIENT_*`
    /// environment variables. Missing keys keep their defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        builder
            .build()
            .context("Failed to read client configuration")?
            .try_deserialize()
            .context("Failed to parse client configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.vector_len == 0 {
            anyhow::bail!("Vector length must be greater than 0");
        }

        if self.batch_size == 0 {
            anyhow::bail!("Batch size must be greater than 0");
        }

        let frame_payload = (self.vector_len * VALUE_SIZE) as u64;
        if frame_payload > self.max_payload_bytes {
            anyhow::bail!(
                "Vectors of {} values ({} bytes) exceed the payload limit of {} bytes",
                self.vector_len,
                frame_payload,
                self.max_payload_bytes
            );
        }

        Ok(())
    }
}
