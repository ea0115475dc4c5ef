//! FileSink - appends one JSON history record per state change

use contracts::{ActivityChanged, ActivityLabel, ActivitySink, ContractError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// JSON-lines output file
    pub path: PathBuf,
    /// Keep existing history instead of truncating
    pub append: bool,
}

impl FileSinkConfig {
    /// Create config from params map (`path`, optional `append`)
    pub fn from_params(params: &HashMap<String, String>) -> io::Result<Self> {
        let path = params.get("path").map(PathBuf::from).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "missing 'path' param")
        })?;
        let append = params
            .get("append")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        Ok(Self { path, append })
    }
}

/// One line of the history file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub label: ActivityLabel,
    pub confidence: f64,
    pub timestamp_ms: u64,
    /// Wall-clock time the record was written (RFC 3339)
    pub recorded_at: String,
}

impl HistoryRecord {
    pub fn from_event(event: &ActivityChanged) -> Self {
        Self {
            label: event.label,
            confidence: event.confidence,
            timestamp_ms: event.timestamp_ms,
            recorded_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Sink that persists a history record per state change
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: BufWriter<File>,
    records: u64,
}

impl FileSink {
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(config.append)
            .truncate(!config.append)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params)?)
    }

    fn append_record(&mut self, event: &ActivityChanged) -> io::Result<()> {
        let record = HistoryRecord::from_event(event);
        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    fn persist(&mut self, event: &ActivityChanged) -> Result<(), ContractError> {
        self.append_record(event).map_err(|e| {
            error!(sink = %self.name, path = %self.config.path.display(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl ActivitySink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, event),
        fields(sink = %self.name, label = %event.label)
    )]
    async fn write(&mut self, event: &ActivityChanged) -> Result<(), ContractError> {
        self.persist(event)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        debug!(sink = %self.name, records = self.records, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn event(label: ActivityLabel, timestamp_ms: u64) -> ActivityChanged {
        ActivityChanged {
            label,
            confidence: 0.8,
            timestamp_ms,
        }
    }

    fn read_records(path: &std::path::Path) -> Vec<HistoryRecord> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_file_sink_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.jsonl");
        let config = FileSinkConfig {
            path: path.clone(),
            append: true,
        };

        let mut sink = FileSink::new("history", config).unwrap();
        sink.write(&event(ActivityLabel::Walking, 2_000)).await.unwrap();
        sink.write(&event(ActivityLabel::Idle, 8_000)).await.unwrap();
        sink.close().await.unwrap();

        let records = read_records(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, ActivityLabel::Walking);
        assert_eq!(records[1].timestamp_ms, 8_000);
        assert!(!records[0].recorded_at.is_empty());
    }

    #[tokio::test]
    async fn test_file_sink_append_and_truncate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let mut params = HashMap::from([("path".to_string(), path.display().to_string())]);

        for _ in 0..2 {
            let mut sink = FileSink::from_params("history", &params).unwrap();
            sink.write(&event(ActivityLabel::Running, 1)).await.unwrap();
            sink.close().await.unwrap();
        }
        assert_eq!(read_records(&path).len(), 2);

        params.insert("append".to_string(), "false".to_string());
        let mut sink = FileSink::from_params("history", &params).unwrap();
        sink.write(&event(ActivityLabel::Cycling, 2)).await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(read_records(&path).len(), 1);
    }

    #[test]
    fn test_missing_path_param() {
        let err = FileSinkConfig::from_params(&HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_history_record_reads_as_event() {
        let record = HistoryRecord::from_event(&event(ActivityLabel::Sleeping, 42));
        let line = serde_json::to_string(&record).unwrap();
        let back: ActivityChanged = serde_json::from_str(&line).unwrap();
        assert_eq!(back, event(ActivityLabel::Sleeping, 42));
    }
}
