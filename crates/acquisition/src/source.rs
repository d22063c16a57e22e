//! Record sources for the replay loop.
//!
//! A [`RecordSource`] is opened once per pass. Each `open` returns the full
//! list of records in file order; the replay loop reopens it when a pass is
//! exhausted, so edits to the file are picked up on the next cycle.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use motorwatch_core::csv::{parse_csv, CsvRecord};
use motorwatch_core::error::CoreError;

/// Error type for record sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not usable CSV (empty, no header).
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: CoreError,
    },
}

/// Where replayed records come from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Open the source and return all of its records, in order.
    async fn open(&self) -> Result<Vec<CsvRecord>, SourceError>;

    /// Short human-readable description for logs and health output.
    fn describe(&self) -> String;
}

/// CSV file on disk, read in full on each open.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for CsvFileSource {
    async fn open(&self) -> Result<Vec<CsvRecord>, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let records = parse_csv(&text).map_err(|source| SourceError::Parse {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "Opened CSV source");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed set of records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<CsvRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<CsvRecord>) -> Self {
        Self { records }
    }

    /// Parse CSV text up front.
    pub fn from_csv(text: &str) -> Result<Self, CoreError> {
        Ok(Self::new(parse_csv(text)?))
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn open(&self) -> Result<Vec<CsvRecord>, SourceError> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn csv_file_source_reads_records_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ts,machine_id,actuator_id,motor_temp_c,motor_rpm,motor_vibration_rms").unwrap();
        writeln!(file, "t1,arm_01,base,40,1000,0.1").unwrap();
        writeln!(file, "t2,arm_01,base,41,1001,0.1").unwrap();

        let source = CsvFileSource::new(file.path());
        let records = source.open().await.unwrap();

        let ts: Vec<_> = records.iter().map(|r| r.get("ts").unwrap()).collect();
        assert_eq!(ts, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let source = CsvFileSource::new("/definitely/not/here.csv");
        let err = source.open().await.unwrap_err();
        assert_matches!(err, SourceError::Io { .. });
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }

    #[tokio::test]
    async fn empty_file_is_a_parse_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = CsvFileSource::new(file.path());
        assert_matches!(source.open().await, Err(SourceError::Parse { .. }));
    }

    #[tokio::test]
    async fn memory_source_returns_the_same_records_every_time() {
        let source = MemorySource::from_csv("ts,machine_id\nt1,arm\nt2,arm\n").unwrap();
        assert_eq!(source.open().await.unwrap().len(), 2);
        assert_eq!(source.open().await.unwrap().len(), 2);
        assert_eq!(source.describe(), "memory (2 records)");
    }
}
