use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::session::{MAX_SCORE, MIN_SCORE};
use crate::errors::LabelerError;
use crate::utils::video_file_name;

pub use crate::types::{RaterName, SourceName, VideoFileName};

/// Record identifier: supplied by the source or derived from the line position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Id taken from the record's `id`/`idx` field, rendered as text.
    Supplied(String),
    /// Zero-based line position in the source, used when no id field exists.
    Ordinal(usize),
}

impl RecordId {
    /// Text form used in exports and log lines.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Supplied(id) => f.write_str(id),
            RecordId::Ordinal(idx) => write!(f, "{idx}"),
        }
    }
}

/// Canonical record produced by the normalizer from one JSON-lines entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Stable id, unique within a loaded source.
    pub id: RecordId,
    /// Path-like video reference; only the final component is meaningful.
    pub video_ref: Option<String>,
    /// Prompt shown to the rater.
    pub prompt: Option<String>,
    /// Generated answer being rated.
    pub answer: Option<String>,
}

impl CanonicalRecord {
    /// Final path component of `video_ref`, if any.
    pub fn video_file_name(&self) -> Option<VideoFileName> {
        self.video_ref.as_deref().and_then(video_file_name)
    }
}

/// Mean opinion score constrained to 1..=5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct MosScore(u8);

impl MosScore {
    /// Validate and wrap a raw score.
    pub fn new(value: i64) -> Result<Self, LabelerError> {
        if value < MIN_SCORE as i64 || value > MAX_SCORE as i64 {
            return Err(LabelerError::ScoreOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    /// Raw score value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for MosScore {
    type Error = LabelerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        MosScore::new(value)
    }
}

impl From<MosScore> for u8 {
    fn from(value: MosScore) -> Self {
        value.0
    }
}

impl fmt::Display for MosScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One stored score for a (record, rater) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Scored record.
    pub record_id: RecordId,
    /// Rater who wrote the score.
    pub rater: RaterName,
    /// Stored 1-5 score.
    pub score: MosScore,
    /// Video filename shown when the score was written (empty when absent).
    pub video: VideoFileName,
    /// Time of the last write for this pair.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mos_score_rejects_values_outside_range() {
        assert!(MosScore::new(0).is_err());
        assert!(MosScore::new(6).is_err());
        assert_eq!(MosScore::new(1).unwrap().get(), 1);
        assert_eq!(MosScore::new(5).unwrap().get(), 5);
    }

    #[test]
    fn record_id_displays_supplied_and_ordinal_forms() {
        assert_eq!(RecordId::Supplied("clip-7".into()).to_string(), "clip-7");
        assert_eq!(RecordId::Ordinal(12).to_string(), "12");
    }

    #[test]
    fn video_file_name_uses_final_component() {
        let record = CanonicalRecord {
            id: RecordId::Ordinal(0),
            video_ref: Some("/mnt/data/videos/test/a.mp4".into()),
            prompt: None,
            answer: None,
        };
        assert_eq!(record.video_file_name().as_deref(), Some("a.mp4"));
    }
}
