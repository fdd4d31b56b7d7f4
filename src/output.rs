//! Artifact writer.
//!
//! Three independent files come out of a harvest:
//! - the raw records as a JSON array
//! - the flattened `drawDetails` rows as CSV
//! - the failed draw numbers as a JSON array
//!
//! Each one is skipped when its source is empty, and a failure writing one
//! does not stop the others from being attempted.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::aggregate::AggregateState;
use crate::config::OutputConfig;
use crate::error::{Error, Result};
use crate::types::DetailRow;

/// What happened to one artifact
#[derive(Debug)]
pub enum ArtifactStatus {
    /// The file was written
    Written(PathBuf),
    /// Nothing to write, the file was left alone
    Skipped,
    /// The write failed
    Failed {
        /// Target path
        path: PathBuf,
        /// Why it failed
        error: Error,
    },
}

impl ArtifactStatus {
    /// Whether this artifact failed
    pub fn is_failed(&self) -> bool {
        matches!(self, ArtifactStatus::Failed { .. })
    }
}

/// Per-artifact result of [`ArtifactWriter::write_all`]
#[derive(Debug)]
pub struct ArtifactReport {
    /// Raw records (`lotteries.json`)
    pub records: ArtifactStatus,
    /// Flattened details (`lotteries.csv`)
    pub details: ArtifactStatus,
    /// Failed draw numbers (`failed_draw_numbers.json`)
    pub failures: ArtifactStatus,
}

impl ArtifactReport {
    /// All three statuses, in write order
    pub fn statuses(&self) -> [&ArtifactStatus; 3] {
        [&self.records, &self.details, &self.failures]
    }

    /// True when no artifact failed
    pub fn is_complete(&self) -> bool {
        self.statuses().iter().all(|s| !s.is_failed())
    }

    /// Number of artifacts that failed
    pub fn failed_count(&self) -> usize {
        self.statuses().iter().filter(|s| s.is_failed()).count()
    }
}

/// Writes an [`AggregateState`] to the configured output directory
#[derive(Clone, Debug)]
pub struct ArtifactWriter {
    config: OutputConfig,
}

impl ArtifactWriter {
    /// Create a writer for the given output locations
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Output locations this writer targets
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Write every non-empty artifact.
    ///
    /// Returns `Err` only when the output directory cannot be created, since
    /// then nothing can be attempted. Individual write failures are reported
    /// in the [`ArtifactReport`].
    pub fn write_all(&self, state: &AggregateState) -> Result<ArtifactReport> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create output directory '{}': {}",
                    self.config.output_dir.display(),
                    e
                ),
            ))
        })?;

        let records = attempt(
            self.config.records_path(),
            !state.all_records.is_empty(),
            |path| write_json(path, &state.all_records),
        );
        let details = attempt(
            self.config.details_path(),
            !state.flattened_details.is_empty(),
            |path| write_csv(path, &state.flattened_details),
        );
        let failures = attempt(
            self.config.failures_path(),
            !state.failed_draw_numbers.is_empty(),
            |path| write_json(path, &state.failed_draw_numbers),
        );

        Ok(ArtifactReport {
            records,
            details,
            failures,
        })
    }
}

fn attempt<W>(path: PathBuf, has_data: bool, write: W) -> ArtifactStatus
where
    W: FnOnce(&Path) -> Result<()>,
{
    if !has_data {
        tracing::debug!(path = %path.display(), "Nothing to write, skipping artifact");
        return ArtifactStatus::Skipped;
    }
    match write(&path) {
        Ok(()) => ArtifactStatus::Written(path),
        Err(error) => ArtifactStatus::Failed { path, error },
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Union of keys across rows, in the order they are first seen.
pub fn detail_columns(rows: &[DetailRow]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Render one JSON value as a CSV cell.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => other.to_string(),
    }
}

fn write_csv(path: &Path, rows: &[DetailRow]) -> Result<()> {
    let columns = detail_columns(rows);
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|column| cell(row.get(column))))?;
    }
    writer.flush()?;
    Ok(())
}
