//! JSON-lines recordings of sensor readings
//!
//! One `SensorReading` object per line; blank lines and `#` comments are
//! skipped.

use std::io::{BufRead, Write};

use contracts::SensorReading;
use tracing::warn;

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};

/// Read every reading, failing on the first malformed line
pub fn read_readings<R: BufRead>(reader: R) -> Result<Vec<SensorReading>> {
    let mut readings = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(reading) = parse_line(idx + 1, &line)? {
            readings.push(reading);
        }
    }
    Ok(readings)
}

/// Read every well-formed reading, skipping and counting malformed lines
pub fn read_readings_lenient<R: BufRead>(
    reader: R,
    metrics: &IngestionMetrics,
) -> Result<Vec<SensorReading>> {
    let mut readings = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(idx + 1, &line) {
            Ok(Some(reading)) => readings.push(reading),
            Ok(None) => {}
            Err(e) => {
                metrics.record_parse_error();
                warn!(error = %e, "skipping malformed reading");
            }
        }
    }
    Ok(readings)
}

/// Write readings one per line
pub fn write_readings<'a, W, I>(mut writer: W, readings: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a SensorReading>,
{
    let mut count = 0;
    for reading in readings {
        serde_json::to_writer(&mut writer, reading).map_err(std::io::Error::from)?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

fn parse_line(line_no: usize, line: &str) -> Result<Option<SensorReading>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| IngestionError::ParseFailed {
            line: line_no,
            message: e.to_string(),
        })
}
