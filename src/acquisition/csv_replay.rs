//! CSV replay of recorded readings
//!
//! Expected CSV format (header optional):
//! `id,timestamp,temperature`
//!
//! A two-column `timestamp,temperature` file is also accepted; ids are then
//! generated from the line number.

use async_trait::async_trait;
use std::path::Path;

use super::IngestError;
use crate::pipeline::source::ReadingSource;
use crate::types::Reading;

/// Load readings from a CSV file, sorted by timestamp.
pub fn read_csv_readings(path: &Path) -> Result<Vec<Reading>, IngestError> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let readings = parse_csv_readings(&text)?;
    tracing::info!(count = readings.len(), path = %path.display(), "Loaded readings from CSV");
    Ok(readings)
}

/// Parse CSV text into readings sorted by timestamp.
pub fn parse_csv_readings(text: &str) -> Result<Vec<Reading>, IngestError> {
    let mut readings = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line_num == 1 && is_header(line) {
            continue;
        }
        readings.push(parse_csv_line(line, line_num)?);
    }

    readings.sort_by_key(|r| r.timestamp);
    Ok(readings)
}

fn is_header(line: &str) -> bool {
    line.split(',')
        .any(|f| matches!(f.trim().to_ascii_lowercase().as_str(), "timestamp" | "temperature"))
}

fn parse_csv_line(line: &str, line_num: usize) -> Result<Reading, IngestError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let (id, ts, temp) = match fields.as_slice() {
        [id, ts, temp, ..] => (id.to_string(), *ts, *temp),
        [ts, temp] => (format!("line-{line_num}"), *ts, *temp),
        _ => {
            return Err(IngestError::Csv {
                line: line_num,
                reason: format!("expected 2 or 3 fields, got {}", fields.len()),
            })
        }
    };

    let timestamp = ts.parse::<u64>().map_err(|_| IngestError::Csv {
        line: line_num,
        reason: format!("cannot parse timestamp '{ts}'"),
    })?;
    let temperature = temp
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| IngestError::Csv {
            line: line_num,
            reason: format!("cannot parse temperature '{temp}'"),
        })?;

    Ok(Reading {
        id,
        timestamp,
        temperature,
    })
}

// ============================================================================
// Replay Source
// ============================================================================

/// Serves recorded readings the way the realtime database would: each poll
/// reveals `step` more readings and returns the trailing `window`.
///
/// Once everything is revealed, polls keep returning the final window, which
/// the ingestor sees as "no new data".
pub struct CsvReplaySource {
    readings: Vec<Reading>,
    revealed: usize,
    step: usize,
    window: usize,
}

impl CsvReplaySource {
    pub fn new(readings: Vec<Reading>, step: usize, window: usize) -> Self {
        Self {
            readings,
            revealed: 0,
            step: step.max(1),
            window: window.max(1),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.revealed >= self.readings.len()
    }
}

#[async_trait]
impl ReadingSource for CsvReplaySource {
    async fn poll(&mut self) -> Result<Vec<Reading>, IngestError> {
        self.revealed = (self.revealed + self.step).min(self.readings.len());
        let start = self.revealed.saturating_sub(self.window);
        Ok(self.readings[start..self.revealed].to_vec())
    }

    fn source_name(&self) -> &str {
        "CSV replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_three_column_with_header() {
        let text = "id,timestamp,temperature\na,200,9.2\nb,100,5.0\n";
        let readings = parse_csv_readings(text).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].id, "b");
        assert_eq!(readings[1].timestamp, 200);
    }

    #[test]
    fn parses_two_column_without_header() {
        let readings = parse_csv_readings("100,5.0\n\n160,5.4\n").unwrap();
        assert_eq!(readings[1].id, "line-3");
    }

    #[test]
    fn bad_temperature_names_line() {
        match parse_csv_readings("a,100,warm\n") {
            Err(IngestError::Csv { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected Csv error, got {other:?}"),
        }
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,timestamp,temperature").unwrap();
        writeln!(file, "r1,100,4.5").unwrap();
        let readings = read_csv_readings(file.path()).unwrap();
        assert_eq!(readings, vec![Reading::new("r1", 100, 4.5)]);
    }

    #[tokio::test]
    async fn replay_reveals_progressively() {
        let readings: Vec<Reading> = (0..5).map(|i| Reading::new(format!("r{i}"), 100 + i, 5.0)).collect();
        let mut source = CsvReplaySource::new(readings, 2, 3);
        assert_eq!(source.poll().await.unwrap().len(), 2);
        let second = source.poll().await.unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second[2].id, "r3");
        let third = source.poll().await.unwrap();
        assert_eq!(third.last().unwrap().id, "r4");
        assert!(source.is_exhausted());
        assert_eq!(source.poll().await.unwrap(), third);
    }

    #[test]
    fn empty_replay_is_exhausted_immediately() {
        let mut source = CsvReplaySource::new(Vec::new(), 0, 0);
        assert!(source.is_exhausted());
        let polled = tokio_test::block_on(source.poll()).unwrap();
        assert!(polled.is_empty());
    }
}
