//! Reading acquisition module
//!
//! Handles reading ingestion from the realtime database (HTTP polling) and
//! from CSV files (offline replay).

pub mod csv_replay;
pub mod rtdb_source;

pub use csv_replay::{parse_csv_readings, read_csv_readings, CsvReplaySource};
pub use rtdb_source::{decode_readings, RtdbSource};

/// Reading fetch or decode failure.
///
/// Always recovered locally: the previous sensor state is kept and the
/// connectivity flag flips to false.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Reading source returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Malformed reading '{id}': {reason}")]
    Malformed { id: String, reason: String },
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV line {line}: {reason}")]
    Csv { line: usize, reason: String },
}
