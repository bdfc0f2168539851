//! Output sinks for summary rows
//!
//! A sink receives one complete [`SummaryRow`] per batch and owns all
//! formatting and persistence.

pub mod csv;
pub mod json;

use anyhow::Result;
use ratebench_shared::types::vector::SummaryRow;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub use self::csv::CsvSink;
pub use self::json::JsonLinesSink;

/// Destination for summary rows
pub trait RowSink: Send {
    fn write_row(&mut self, row: &SummaryRow) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// File format of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One comma-separated row of values per batch
    #[default]
    Csv,
    /// One JSON object per line
    JsonLines,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::JsonLines => "jsonl",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json-lines" | "jsonl" | "json" => Ok(OutputFormat::JsonLines),
            _ => anyhow::bail!("Invalid output format: {}", s),
        }
    }
}

/// Rows kept in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<SummaryRow>,
}

impl RowSink for MemorySink {
    fn write_row(&mut self, row: &SummaryRow) -> Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }
}

/// `out_<unix seconds>.<ext>` in the working directory
pub fn default_output_path(format: OutputFormat) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    PathBuf::from(format!("out_{}.{}", secs, format.extension()))
}

/// Create the output file for `format` at `path`.
pub fn open_sink(format: OutputFormat, path: &Path) -> Result<Box<dyn RowSink>> {
    let sink: Box<dyn RowSink> = match format {
        OutputFormat::Csv => Box::new(CsvSink::create(path)?),
        OutputFormat::JsonLines => Box::new(JsonLinesSink::create(path)?),
    };
    Ok(sink)
}
