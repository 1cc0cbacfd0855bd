use std::io;

use thiserror::Error;

use crate::types::SourceName;

/// Error type for source loading, mapping tables, scoring, and export failures.
#[derive(Debug, Error)]
pub enum LabelerError {
    /// No input mode produced a usable source.
    #[error("data source '{source_name}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Source (or `<none>`) that could not be used.
        source_name: SourceName,
        /// Per-mode failures and guidance.
        reason: String,
    },
    /// A JSON-lines line could not be decoded into an object.
    #[error("line {line} is not a JSON object: {reason}")]
    LineParse {
        /// Zero-based line position.
        line: usize,
        /// Decoder message.
        reason: String,
    },
    /// Mapping CSV is unreadable or lacks the `name` column.
    #[error("mapping table error: {0}")]
    MappingTable(String),
    /// Score outside 1-5.
    #[error("score {0} is outside the 1-5 range")]
    ScoreOutOfRange(i64),
    /// Invalid configuration value or catalog entry name.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// CSV read or write failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
