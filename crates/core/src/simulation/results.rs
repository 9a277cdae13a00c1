//! Per-run result records and append-only sinks
//!
//! Each completed run produces one [`RunRecord`]. The CSV sink writes the
//! header row once, when the file is first created, and appends afterwards,
//! so an interrupted sweep can be resumed by counting the rows already
//! present. Rows are not deduplicated: re-running a combination appends it again.

use super::run::RunMetrics;
use crate::core_types::EnvironmentParams;
use crate::error::SimError;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Column names of the result table, in order
pub const RESULT_COLUMNS: [&str; 8] = [
    "humidity",
    "precipitation_strength",
    "precipitation_chance",
    "wind_strength",
    "drying_effect",
    "burned_count",
    "burned_fraction",
    "steps_taken",
];

/// Parameters and burn metrics of one completed run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub humidity: f32,
    pub precipitation_strength: f32,
    pub precipitation_chance: f32,
    pub wind_strength: f32,
    pub drying_effect: f32,
    pub burned_count: usize,
    pub burned_fraction: f64,
    pub steps_taken: usize,
}

impl RunRecord {
    pub fn new(env: &EnvironmentParams, metrics: &RunMetrics) -> Self {
        Self {
            humidity: env.humidity,
            precipitation_strength: env.precipitation_strength,
            precipitation_chance: env.precipitation_chance,
            wind_strength: env.wind_strength,
            drying_effect: env.drying_effect(),
            burned_count: metrics.burned_count,
            burned_fraction: metrics.burned_fraction,
            steps_taken: metrics.steps_taken,
        }
    }

    /// Comma separated row in [`RESULT_COLUMNS`] order.
    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            self.humidity,
            self.precipitation_strength,
            self.precipitation_chance,
            self.wind_strength,
            self.drying_effect,
            self.burned_count,
            self.burned_fraction,
            self.steps_taken
        )
    }
}

/// Destination for completed run records
pub trait ResultSink {
    /// Append one record.
    ///
    /// # Errors
    /// Implementation specific, typically [`SimError::Io`].
    fn append(&mut self, record: &RunRecord) -> Result<(), SimError>;
}

/// Collects records in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<RunRecord>,
}

impl ResultSink for MemorySink {
    fn append(&mut self, record: &RunRecord) -> Result<(), SimError> {
        self.records.push(*record);
        Ok(())
    }
}

/// Append-only CSV writer
#[derive(Debug)]
pub struct CsvResultSink<W: Write> {
    writer: W,
}

impl<W: Write> CsvResultSink<W> {
    /// Wrap `writer`, emitting the header row first when `write_header` is set.
    ///
    /// # Errors
    /// [`SimError::Io`] if the header cannot be written.
    pub fn new(mut writer: W, write_header: bool) -> Result<Self, SimError> {
        if write_header {
            writeln!(writer, "{}", RESULT_COLUMNS.join(","))?;
            writer.flush()?;
        }
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl CsvResultSink<BufWriter<File>> {
    /// Open `path` for appending, creating it with a header row if it is new or empty.
    ///
    /// # Errors
    /// [`SimError::Io`] if the file cannot be opened or written.
    pub fn append_to_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let is_new = match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Self::new(BufWriter::new(file), is_new)
    }
}

impl<W: Write> ResultSink for CsvResultSink<W> {
    fn append(&mut self, record: &RunRecord) -> Result<(), SimError> {
        writeln!(self.writer, "{}", record.csv_row())?;
        // Flush per row so a crash never loses completed runs
        self.writer.flush()?;
        Ok(())
    }
}

/// Number of data rows already stored in a result CSV (header excluded).
///
/// A missing file counts as zero rows.
///
/// # Errors
/// [`SimError::Io`] on read failure.
pub fn count_completed_rows(path: impl AsRef<Path>) -> Result<usize, SimError> {
    let file = match File::open(path.as_ref()) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut rows: usize = 0;
    for line in BufReader::new(file).lines() {
        if !line?.trim().is_empty() {
            rows += 1;
        }
    }
    Ok(rows.saturating_sub(1))
}
