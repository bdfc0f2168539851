//! CSV output
//!
//! No header row: each line is `rate_mean,rate_std,mean_0..mean_n,std_0..std_n`.
//! Values use the shortest representation that round-trips the `f64`.

use super::RowSink;
use anyhow::{Context, Result};
use ratebench_shared::types::vector::SummaryRow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct CsvSink<W: Write> {
    writer: BufWriter<W>,
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))
    }
}

impl<W: Write + Send> RowSink for CsvSink<W> {
    fn write_row(&mut self, row: &SummaryRow) -> Result<()> {
        for (i, value) in row.values().enumerate() {
            if i > 0 {
                self.writer.write_all(b",")?;
            }
            write!(self.writer, "{}", value)?;
        }
        self.writer.write_all(b"\n")?;
        // One line per batch: flush so a killed process loses at most this row.
        self.writer.flush().context("Failed to write CSV row")
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush CSV output")
    }
}
