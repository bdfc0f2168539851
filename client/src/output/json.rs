//! JSON Lines output
//!
//! One serialized [`SummaryRow`] object per line. JSON has no encoding for
//! NaN or infinities, so rows carrying them are rejected instead of being
//! written as `null`.

use super::RowSink;
use anyhow::{Context, Result};
use ratebench_shared::types::vector::SummaryRow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
}

impl JsonLinesSink<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush JSON output: {}", e.error()))
    }
}

impl<W: Write + Send> RowSink for JsonLinesSink<W> {
    fn write_row(&mut self, row: &SummaryRow) -> Result<()> {
        if let Some(value) = row.values().find(|v| !v.is_finite()) {
            anyhow::bail!("Row contains {} which JSON cannot represent", value);
        }
        serde_json::to_writer(&mut self.writer, row).context("Failed to serialize row to JSON")?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().context("Failed to write JSON row")
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush JSON output")
    }
}
