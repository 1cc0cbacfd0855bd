//! Score table keyed by (record id, rater), with CSV export and resume.
//!
//! Writes for an existing pair overwrite the stored entry in place, so the
//! exported table has exactly one row per pair regardless of edit count.
//! Exports are written per rater: one file holds one rater's rows.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::session::EXPORT_EXTENSION;
use crate::data::{MosScore, RecordId, ScoreEntry};
use crate::errors::LabelerError;
use crate::types::{RaterName, VideoFileName};
use crate::utils::split_extension;

/// Row layout of the exported score table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRow {
    /// Record id in text form.
    pub id: String,
    /// Video filename, empty when the record had none.
    #[serde(default)]
    pub video: String,
    /// Absent in tables written before raters were recorded per row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rater: Option<RaterName>,
    /// Stored 1-5 score.
    pub score: MosScore,
    /// Last write time (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&ScoreEntry> for ScoreRow {
    fn from(entry: &ScoreEntry) -> Self {
        Self {
            id: entry.record_id.as_text(),
            video: entry.video.clone(),
            rater: Some(entry.rater.clone()),
            score: entry.score,
            updated_at: Some(entry.updated_at),
        }
    }
}

type ScoreKey = (RecordId, RaterName);

/// Session-owned score table in first-write order.
#[derive(Clone, Debug, Default)]
pub struct ScoreTable {
    entries: IndexMap<ScoreKey, ScoreEntry>,
}

impl ScoreTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the score for `(record_id, rater)`, stamped now.
    pub fn upsert(
        &mut self,
        record_id: RecordId,
        rater: &str,
        score: MosScore,
        video: VideoFileName,
    ) -> &ScoreEntry {
        self.upsert_at(record_id, rater, score, video, Utc::now())
    }

    /// Insert or overwrite with an explicit timestamp.
    pub fn upsert_at(
        &mut self,
        record_id: RecordId,
        rater: &str,
        score: MosScore,
        video: VideoFileName,
        at: DateTime<Utc>,
    ) -> &ScoreEntry {
        let key = (record_id.clone(), rater.to_string());
        // insert_full keeps the original position of an existing key
        let entry = ScoreEntry {
            record_id,
            rater: rater.to_string(),
            score,
            video,
            updated_at: at,
        };
        let (idx, _) = self.entries.insert_full(key, entry);
        &self.entries[idx]
    }

    /// Stored entry for `(record_id, rater)`.
    pub fn get(&self, record_id: &RecordId, rater: &str) -> Option<&ScoreEntry> {
        self.entries.get(&(record_id.clone(), rater.to_string()))
    }

    /// Number of stored pairs across all raters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before any score is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in first-write order.
    pub fn entries(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.entries.values()
    }

    /// Entries written by `rater`, in first-write order.
    pub fn entries_for_rater<'a>(&'a self, rater: &'a str) -> impl Iterator<Item = &'a ScoreEntry> {
        self.entries().filter(move |entry| entry.rater == rater)
    }

    /// Write `rater`'s entries as CSV with a header row. Returns the row count.
    pub fn write_csv<W: Write>(&self, rater: &str, writer: W) -> Result<usize, LabelerError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut rows = 0usize;
        for entry in self.entries_for_rater(rater) {
            csv_writer.serialize(ScoreRow::from(entry))?;
            rows += 1;
        }
        if rows == 0 {
            csv_writer.write_record(["id", "video", "rater", "score", "updated_at"])?;
        }
        csv_writer.flush()?;
        Ok(rows)
    }

    /// Write `rater`'s entries to `dir/<file_name>`, creating `dir` when needed.
    ///
    /// The file is replaced as a whole, so repeated exports after each score
    /// leave exactly the current rows on disk.
    pub fn export_to(
        &self,
        dir: &Path,
        file_name: &str,
        rater: &str,
    ) -> Result<PathBuf, LabelerError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        let mut buffer = Vec::new();
        let rows = self.write_csv(rater, &mut buffer)?;
        fs::write(&path, buffer)?;
        debug!(
            "[mos:scores] exported rater='{}' rows={} path={}",
            rater,
            rows,
            path.display()
        );
        Ok(path)
    }

    /// Parse rows from a previously exported table.
    ///
    /// Rows without a score or with one outside 1-5 fail the read.
    pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ScoreRow>, LabelerError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut rows = Vec::new();
        for row in csv_reader.deserialize::<ScoreRow>() {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Insert a restored entry, keeping its timestamp.
    pub fn restore(&mut self, entry: ScoreEntry) {
        let key = (entry.record_id.clone(), entry.rater.clone());
        self.entries.insert(key, entry);
    }
}

/// Export file name: `<source stem>_<rater>.csv`.
pub fn export_file_name(source_name: &str, rater: &str) -> String {
    let (stem, _) = split_extension(source_name);
    let rater: String = rater
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}_{rater}.{EXPORT_EXTENSION}")
}
